//! Ticket lifecycle state machine.
//!
//! ```text
//! Open ──schedule──▶ Scheduled ──start──▶ InProgress ──complete──▶ Completed ──review──▶ Closed
//!   └──────────start───────────────▲
//! Open | Scheduled | InProgress ──cancel──▶ Closed
//! ```
//!
//! [`plan`] turns an action into the single partial update the store must
//! apply. It never touches the ticket itself; the desk commits whatever the
//! store confirms.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::error::{DeskError, Result};
use crate::models::{Priority, Ratings, Review, Role, Status, Ticket, TicketUpdate, User};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Schedule(NaiveDate),
    Start,
    Complete,
    Cancel,
    SetPriority(Priority),
    SubmitReview(Ratings),
}

impl Action {
    pub const fn verb(&self) -> &'static str {
        match self {
            Action::Schedule(_) => "schedule",
            Action::Start => "start",
            Action::Complete => "complete",
            Action::Cancel => "cancel",
            Action::SetPriority(_) => "reprioritize",
            Action::SubmitReview(_) => "review",
        }
    }

    /// Statuses the action may be applied from.
    pub const fn allowed_from(&self) -> &'static [Status] {
        match self {
            Action::Schedule(_) => &[Status::Open],
            Action::Start => &[Status::Open, Status::Scheduled],
            Action::Complete => &[Status::InProgress],
            Action::Cancel | Action::SetPriority(_) => {
                &[Status::Open, Status::Scheduled, Status::InProgress]
            }
            Action::SubmitReview(_) => &[Status::Completed],
        }
    }

    const fn required_role(&self) -> Role {
        match self {
            Action::SubmitReview(_) => Role::User,
            _ => Role::Officer,
        }
    }
}

/// Midnight UTC on the chosen day.
pub fn schedule_instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Check `action` against `ticket` and `actor` and build the update that
/// performs it at `now`.
pub fn plan(ticket: &Ticket, action: &Action, actor: &User, now: DateTime<Utc>) -> Result<TicketUpdate> {
    authorize(ticket, action, actor)?;

    if !action.allowed_from().contains(&ticket.status) {
        return Err(invalid(ticket, action));
    }

    let update = match action {
        Action::Schedule(date) => TicketUpdate {
            status: Some(Status::Scheduled),
            scheduled_at: Some(schedule_instant(*date)),
            ..Default::default()
        },
        Action::Start => TicketUpdate {
            status: Some(Status::InProgress),
            started_at: Some(now),
            ..Default::default()
        },
        Action::Complete => TicketUpdate {
            status: Some(Status::Completed),
            completed_at: Some(now),
            assigned_officer: Some(actor.username.clone()),
            ..Default::default()
        },
        Action::Cancel => TicketUpdate {
            status: Some(Status::Closed),
            ..Default::default()
        },
        Action::SetPriority(priority) => TicketUpdate {
            priority: Some(*priority),
            ..Default::default()
        },
        Action::SubmitReview(ratings) => {
            if ticket.review.is_some() {
                return Err(invalid(ticket, action));
            }
            if let Some(criterion) = ratings.first_invalid() {
                return Err(DeskError::Validation(format!(
                    "Please rate every criterion from 1 to 5 stars ('{}' is missing)",
                    criterion.label()
                )));
            }
            TicketUpdate {
                status: Some(Status::Closed),
                review: Some(Review {
                    ratings: ratings.clone(),
                    reviewed_at: now,
                }),
                ..Default::default()
            }
        }
    };

    debug!(ticket = %ticket.id, action = action.verb(), from = %ticket.status, "planned transition");
    Ok(update)
}

fn authorize(ticket: &Ticket, action: &Action, actor: &User) -> Result<()> {
    if actor.role != action.required_role() {
        return Err(DeskError::PermissionDenied {
            role: actor.role,
            action: action.verb(),
        });
    }
    if actor.role == Role::User && ticket.unit != actor.username {
        // Users only review tickets filed by their own unit
        return Err(DeskError::NotFound(ticket.id.clone()));
    }
    Ok(())
}

fn invalid(ticket: &Ticket, action: &Action) -> DeskError {
    DeskError::InvalidTransition {
        id: ticket.id.clone(),
        status: ticket.status,
        action: action.verb(),
    }
}
