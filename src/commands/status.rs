use anyhow::{Context, Result};
use chrono::NaiveDate;

use ticketdesk::desk::Desk;
use ticketdesk::lifecycle::Action;
use ticketdesk::store::TicketStore;

use super::ticket_id;

pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD.", date))
}

pub fn schedule<S: TicketStore>(desk: &Desk<S>, id: &str, date: &str) -> Result<()> {
    let date = parse_date(date)?;
    let ticket = desk.apply(ticket_id(id), Action::Schedule(date))?;
    println!("Scheduled ticket #{} for {}", ticket.id, date.format("%Y-%m-%d"));
    Ok(())
}

pub fn start<S: TicketStore>(desk: &Desk<S>, id: &str) -> Result<()> {
    let ticket = desk.apply(ticket_id(id), Action::Start)?;
    println!("Started ticket #{}", ticket.id);
    Ok(())
}

pub fn complete<S: TicketStore>(desk: &Desk<S>, id: &str) -> Result<()> {
    let ticket = desk.apply(ticket_id(id), Action::Complete)?;
    println!("Completed ticket #{}", ticket.id);
    Ok(())
}

pub fn cancel<S: TicketStore>(desk: &Desk<S>, id: &str) -> Result<()> {
    let ticket = desk.apply(ticket_id(id), Action::Cancel)?;
    println!("Cancelled ticket #{}", ticket.id);
    Ok(())
}
