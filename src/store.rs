//! The ticket store the desk talks to.
//!
//! The desk treats the store as the source of truth: every call either
//! returns the authoritative record or fails, and the desk only commits what
//! came back.

use crate::error::Result;
use crate::models::{Attachment, Priority, Ticket, TicketDraft, TicketUpdate, Upload};

pub trait TicketStore {
    fn list_tickets(&self) -> Result<Vec<Ticket>>;

    /// The store assigns the id, creation time, `Open` status and
    /// `default_priority`.
    fn create_ticket(&self, draft: &TicketDraft, default_priority: Priority) -> Result<Ticket>;

    /// Apply only the fields set in `update`.
    fn update_ticket(&self, id: &str, update: &TicketUpdate) -> Result<Ticket>;

    fn upload_attachment(&self, upload: &Upload) -> Result<Attachment>;

    /// Remove an uploaded attachment that never made it onto a ticket.
    fn discard_attachment(&self, attachment: &Attachment) -> Result<()>;
}

impl<T: TicketStore + ?Sized> TicketStore for &T {
    fn list_tickets(&self) -> Result<Vec<Ticket>> {
        (**self).list_tickets()
    }

    fn create_ticket(&self, draft: &TicketDraft, default_priority: Priority) -> Result<Ticket> {
        (**self).create_ticket(draft, default_priority)
    }

    fn update_ticket(&self, id: &str, update: &TicketUpdate) -> Result<Ticket> {
        (**self).update_ticket(id, update)
    }

    fn upload_attachment(&self, upload: &Upload) -> Result<Attachment> {
        (**self).upload_attachment(upload)
    }

    fn discard_attachment(&self, attachment: &Attachment) -> Result<()> {
        (**self).discard_attachment(attachment)
    }
}
