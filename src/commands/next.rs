use anyhow::{bail, Result};

use ticketdesk::desk::Desk;
use ticketdesk::models::{Role, Ticket};
use ticketdesk::store::TicketStore;
use ticketdesk::views;

/// Suggested order grouped into visits: consecutive tickets in the same unit
/// are one stop.
pub fn visits<'a>(order: &[&'a Ticket]) -> Vec<(&'a str, Vec<&'a Ticket>)> {
    let mut stops: Vec<(&str, Vec<&Ticket>)> = Vec::new();
    for ticket in order {
        if let Some((unit, group)) = stops.last_mut() {
            if *unit == ticket.unit {
                group.push(*ticket);
                continue;
            }
        }
        stops.push((ticket.unit.as_str(), vec![*ticket]));
    }
    stops
}

pub fn run<S: TicketStore>(desk: &Desk<S>) -> Result<()> {
    if desk.user().role != Role::Officer {
        bail!("Only officers can ask for a schedule suggestion");
    }

    let tickets = desk.tickets();
    let order = views::suggest_schedule(&tickets);

    if order.is_empty() {
        println!("No tickets to schedule.");
        return Ok(());
    }

    let top = order[0];
    println!("Next: #{} [{}] {} ({})", top.id, top.priority, top.title, top.unit);
    if !top.description.is_empty() {
        let preview: String = top.description.chars().take(80).collect();
        let suffix = if top.description.chars().count() > 80 { "..." } else { "" };
        println!("       {}{}", preview, suffix);
    }

    println!();
    println!("Suggested order:");
    for (stop, (unit, group)) in visits(&order).into_iter().enumerate() {
        println!("  {}. {}", stop + 1, unit);
        for ticket in group {
            println!(
                "       #{} [{}] {} / {}: {}",
                ticket.id, ticket.priority, ticket.category, ticket.sub_category, ticket.title
            );
        }
    }

    println!();
    println!("Run: ticketdesk schedule {} <YYYY-MM-DD>", top.id);
    Ok(())
}
