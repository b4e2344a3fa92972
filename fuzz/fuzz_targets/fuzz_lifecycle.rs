#![no_main]

//! Fuzz target for the ticket lifecycle.
//!
//! Drives random action sequences from random roles through a desk backed by
//! a real database and checks that the store and the desk always agree, and
//! that no action ever leaves a ticket in a state the transition table does
//! not allow.

use arbitrary::Arbitrary;
use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use tempfile::tempdir;

use ticketdesk::db::Database;
use ticketdesk::desk::Desk;
use ticketdesk::lifecycle::Action;
use ticketdesk::models::{Priority, Ratings, Role, Status, TicketDraft, User};
use ticketdesk::store::TicketStore;

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Actor {
    Reporter,
    OtherUnit,
    Officer,
    Admin,
}

#[derive(Arbitrary, Debug)]
enum Step {
    Schedule { day: u16 },
    Start,
    Complete,
    Cancel,
    Priority(u8),
    Review(u8),
}

#[derive(Arbitrary, Debug)]
struct LifecycleInput {
    steps: Vec<(Actor, Step)>,
}

fn user(actor: Actor) -> User {
    match actor {
        Actor::Reporter => User::new("Keuangan", Role::User),
        Actor::OtherUnit => User::new("Gudang", Role::User),
        Actor::Officer => User::new("budi", Role::Officer),
        Actor::Admin => User::new("admin", Role::Admin),
    }
}

fn action(step: &Step) -> Action {
    match step {
        Step::Schedule { day } => {
            let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();
            Action::Schedule(base + chrono::Days::new(u64::from(*day % 730)))
        }
        Step::Start => Action::Start,
        Step::Complete => Action::Complete,
        Step::Cancel => Action::Cancel,
        Step::Priority(p) => Action::SetPriority(match p % 3 {
            0 => Priority::Low,
            1 => Priority::Medium,
            _ => Priority::High,
        }),
        Step::Review(stars) => Action::SubmitReview(Ratings::uniform(stars % 7)),
    }
}

fuzz_target!(|input: LifecycleInput| {
    let dir = match tempdir() {
        Ok(d) => d,
        Err(_) => return,
    };
    let db = match Database::open(&dir.path().join("tickets.db"), &dir.path().join("attachments")) {
        Ok(d) => d,
        Err(_) => return,
    };

    let reporter = Desk::new(&db, user(Actor::Reporter), Priority::Medium);
    let draft = TicketDraft {
        title: "AC bocor".to_string(),
        reporter_name: "Sari".to_string(),
        category: "AC".to_string(),
        sub_category: "AC bocor".to_string(),
        description: "Menetes".to_string(),
        ..Default::default()
    };
    let Ok(ticket) = reporter.create(draft, &[]) else {
        return;
    };

    for (actor, step) in input.steps.iter().take(32) {
        let desk = Desk::new(&db, user(*actor), Priority::Medium);
        if desk.refresh().is_err() {
            return;
        }
        let before = desk.ticket(&ticket.id).expect("ticket listed");
        let action = action(step);
        let allowed = action.allowed_from().contains(&before.status);

        match desk.apply(&ticket.id, action) {
            Ok(after) => {
                assert!(allowed, "{:?} accepted from {}", step, before.status);
                let stored = db
                    .list_tickets()
                    .expect("list")
                    .into_iter()
                    .find(|t| t.id == ticket.id)
                    .expect("stored");
                assert_eq!(stored, after);
                if after.status == Status::Closed && after.completed_at.is_some() {
                    assert!(after.review.is_some());
                }
            }
            Err(_) => {
                let stored = desk.ticket(&ticket.id).expect("ticket listed");
                assert_eq!(stored, before);
            }
        }
    }
});
