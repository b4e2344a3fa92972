use anyhow::Result;

use ticketdesk::desk::Desk;
use ticketdesk::models::{Role, Status, Ticket};
use ticketdesk::store::TicketStore;
use ticketdesk::views::{self, Board, ReviewFilter};

/// Tickets the signed-in role should see, in display order.
pub fn visible<'a, S: TicketStore>(
    desk: &Desk<S>,
    tickets: &'a [Ticket],
    filter: ReviewFilter,
    status: Option<Status>,
    board: Board,
) -> Vec<&'a Ticket> {
    let user = desk.user();
    match user.role {
        Role::User => views::user_tickets(tickets, &user.username, filter),
        Role::Officer => views::officer_queue(tickets, status),
        Role::Admin => views::monitoring(tickets, board),
    }
}

pub fn run<S: TicketStore>(
    desk: &Desk<S>,
    filter: ReviewFilter,
    status: Option<Status>,
    board: Board,
) -> Result<()> {
    let tickets = desk.tickets();
    let shown = visible(desk, &tickets, filter, status, board);

    if shown.is_empty() {
        println!("No tickets found.");
        return Ok(());
    }

    for ticket in shown {
        println!("{}", format_row(ticket, desk.user().role));
    }

    Ok(())
}

fn format_row(ticket: &Ticket, role: Role) -> String {
    let status_display = format!("[{}]", ticket.status);
    let date = ticket.created_at.format("%Y-%m-%d");
    let mut row = format!(
        "#{:<4} {:13} {:<40} {:6} {}",
        ticket.id,
        status_display,
        truncate(&ticket.title, 40),
        ticket.priority,
        date
    );
    if role != Role::User {
        row.push_str(&format!("  {}", ticket.unit));
    }
    if role == Role::Officer {
        if let Some(taken) = views::time_taken(ticket) {
            row.push_str(&format!("  ({})", taken));
        }
    }
    if role == Role::User && ticket.review.is_some() {
        row.push_str("  reviewed");
    }
    row
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", truncated)
    }
}
