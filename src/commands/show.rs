use anyhow::{bail, Result};

use ticketdesk::desk::Desk;
use ticketdesk::duration::review_delay;
use ticketdesk::models::{Criterion, Role, Ticket};
use ticketdesk::store::TicketStore;
use ticketdesk::views;

use super::ticket_id;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn run<S: TicketStore>(desk: &Desk<S>, id: &str) -> Result<()> {
    let id = ticket_id(id);
    let ticket = desk.ticket(id)?;

    let user = desk.user();
    if user.role == Role::User && ticket.unit != user.username {
        bail!("Ticket #{} not found", id);
    }

    for line in describe(&ticket) {
        println!("{}", line);
    }
    Ok(())
}

pub fn describe(ticket: &Ticket) -> Vec<String> {
    let mut lines = vec![
        format!("Ticket #{}: {}", ticket.id, ticket.title),
        format!("Status: {}", ticket.status),
        format!("Priority: {}", ticket.priority),
        format!("Unit: {}", ticket.unit),
        format!("Reporter: {}", ticket.reporter_name),
        format!("Category: {} / {}", ticket.category, ticket.sub_category),
        format!("Created: {}", ticket.created_at.format(DATE_FORMAT)),
    ];

    if let Some(at) = ticket.scheduled_at {
        lines.push(format!("Scheduled: {}", at.format("%Y-%m-%d")));
    }
    if let Some(at) = ticket.started_at {
        lines.push(format!("Started: {}", at.format(DATE_FORMAT)));
    }
    if let Some(at) = ticket.completed_at {
        lines.push(format!("Completed: {}", at.format(DATE_FORMAT)));
    }
    if let Some(officer) = &ticket.assigned_officer {
        lines.push(format!("Officer: {}", officer));
    }
    if let Some(taken) = views::time_taken(ticket) {
        lines.push(format!("Time taken: {}", taken));
    }

    if !ticket.description.is_empty() {
        lines.push(String::new());
        lines.push("Description:".to_string());
        lines.extend(ticket.description.lines().map(|l| format!("  {}", l)));
    }

    if !ticket.attachments.is_empty() {
        lines.push(String::new());
        lines.push("Attachments:".to_string());
        for attachment in &ticket.attachments {
            lines.push(format!("  {} <{}>", attachment.name, attachment.url));
        }
    }

    if let Some(review) = &ticket.review {
        lines.push(String::new());
        let mut heading = format!("Review ({})", review.reviewed_at.format(DATE_FORMAT));
        if let Some(completed) = ticket.completed_at {
            heading.push_str(&format!(", {} after completion", review_delay(completed, review.reviewed_at)));
        }
        lines.push(heading);
        for criterion in Criterion::ALL {
            let score = review.score(criterion);
            let mut line = format!("  {:<28} {}/5", criterion.label(), score.stars);
            if !score.comment.is_empty() {
                line.push_str(&format!("  \"{}\"", score.comment));
            }
            lines.push(line);
        }
    }

    lines
}
