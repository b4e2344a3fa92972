use anyhow::Result;

use ticketdesk::desk::Desk;
use ticketdesk::lifecycle::Action;
use ticketdesk::models::Priority;
use ticketdesk::store::TicketStore;

use super::ticket_id;

pub fn priority<S: TicketStore>(desk: &Desk<S>, id: &str, priority: Priority) -> Result<()> {
    let ticket = desk.apply(ticket_id(id), Action::SetPriority(priority))?;
    println!("Set priority of ticket #{} to {}", ticket.id, ticket.priority);
    Ok(())
}
