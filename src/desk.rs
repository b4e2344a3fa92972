//! Session state for one signed-in actor.
//!
//! The desk owns the ticket list the views render from. Every change follows
//! the same path: validate and plan locally, send one request to the store,
//! and only on success replace the local record with what the store
//! returned. A failed request leaves the list exactly as it was.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::error::{DeskError, Result};
use crate::lifecycle::{self, Action};
use crate::models::{Priority, Role, Ticket, TicketDraft, Upload, User};
use crate::store::TicketStore;

pub struct Desk<S> {
    store: S,
    user: User,
    default_priority: Priority,
    tickets: Mutex<Vec<Ticket>>,
    in_flight: Mutex<HashSet<String>>,
}

/// Marks a ticket as having an outstanding request until dropped.
pub struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: TicketStore> Desk<S> {
    pub fn new(store: S, user: User, default_priority: Priority) -> Self {
        Desk {
            store,
            user,
            default_priority,
            tickets: Mutex::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of the current ticket list.
    pub fn tickets(&self) -> Vec<Ticket> {
        lock(&self.tickets).clone()
    }

    pub fn ticket(&self, id: &str) -> Result<Ticket> {
        lock(&self.tickets)
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| DeskError::NotFound(id.to_string()))
    }

    /// Reload the list from the store. On failure the previous list stays.
    pub fn refresh(&self) -> Result<usize> {
        let fresh = self.store.list_tickets().map_err(|e| {
            warn!(error = %e, "failed to load tickets");
            e
        })?;
        let count = fresh.len();
        *lock(&self.tickets) = fresh;
        debug!(count, "loaded tickets");
        Ok(count)
    }

    /// Claim `id` for one outstanding request.
    pub fn claim(&self, id: &str) -> Result<InFlight<'_>> {
        let mut set = lock(&self.in_flight);
        if !set.insert(id.to_string()) {
            return Err(DeskError::Busy(id.to_string()));
        }
        Ok(InFlight {
            set: &self.in_flight,
            id: id.to_string(),
        })
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        lock(&self.in_flight).contains(id)
    }

    /// File a new ticket for the signed-in user's unit. Files are uploaded
    /// one by one first; the ticket is created only if every upload worked.
    /// If anything fails after an upload, the files uploaded here are
    /// discarded again.
    pub fn create(&self, mut draft: TicketDraft, uploads: &[Upload]) -> Result<Ticket> {
        if self.user.role != Role::User {
            return Err(DeskError::PermissionDenied {
                role: self.user.role,
                action: "create",
            });
        }
        draft.unit = self.user.username.clone();
        validate_draft(&draft)?;

        let existing = draft.attachments.len();
        let ticket = match self.upload_and_file(&mut draft, uploads) {
            Ok(ticket) => ticket,
            Err(e) => {
                for attachment in &draft.attachments[existing..] {
                    if let Err(discard) = self.store.discard_attachment(attachment) {
                        warn!(id = %attachment.id, error = %discard, "failed to discard attachment");
                    }
                }
                return Err(e);
            }
        };
        info!(id = %ticket.id, unit = %ticket.unit, "created ticket");
        lock(&self.tickets).push(ticket.clone());
        Ok(ticket)
    }

    fn upload_and_file(&self, draft: &mut TicketDraft, uploads: &[Upload]) -> Result<Ticket> {
        for upload in uploads {
            let attachment = self.store.upload_attachment(upload)?;
            debug!(id = %attachment.id, name = %attachment.name, "uploaded attachment");
            draft.attachments.push(attachment);
        }
        validate_attachments(draft)?;
        self.store.create_ticket(draft, self.default_priority)
    }

    /// Run one lifecycle action against a ticket.
    pub fn apply(&self, id: &str, action: Action) -> Result<Ticket> {
        let current = self.ticket(id)?;
        let _guard = self.claim(id)?;

        let update = lifecycle::plan(&current, &action, &self.user, Utc::now())?;
        let confirmed = self.store.update_ticket(id, &update).map_err(|e| {
            warn!(ticket = %id, action = action.verb(), error = %e, "update failed, keeping previous state");
            e
        })?;

        let mut tickets = lock(&self.tickets);
        match tickets.iter_mut().find(|t| t.id == id) {
            Some(slot) => *slot = confirmed.clone(),
            None => tickets.push(confirmed.clone()),
        }
        info!(ticket = %id, action = action.verb(), status = %confirmed.status, "ticket updated");
        Ok(confirmed)
    }
}

fn validate_draft(draft: &TicketDraft) -> Result<()> {
    let required = [
        ("reporter name", &draft.reporter_name),
        ("title", &draft.title),
        ("category", &draft.category),
        ("sub-category", &draft.sub_category),
        ("description", &draft.description),
        ("unit", &draft.unit),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(DeskError::Validation(format!(
            "Please fill in every field before submitting (missing: {})",
            missing.join(", ")
        )));
    }
    validate_attachments(draft)
}

fn validate_attachments(draft: &TicketDraft) -> Result<()> {
    let mut seen = HashSet::new();
    for attachment in &draft.attachments {
        if !seen.insert(attachment.id.as_str()) {
            return Err(DeskError::Validation(format!(
                "Attachment id '{}' appears more than once",
                attachment.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Attachment, Criterion, Ratings, Status, TicketUpdate};
    use crate::ratings;
    use chrono::{NaiveDate, TimeZone};
    use std::cell::Cell;
    use tempfile::tempdir;

    fn setup_store() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db"), &dir.path().join("attachments")).unwrap();
        (db, dir)
    }

    fn reporter() -> User {
        User::new("Gedung A", Role::User)
    }

    fn officer() -> User {
        User::new("budi", Role::Officer)
    }

    fn draft() -> TicketDraft {
        TicketDraft {
            title: "AC tidak dingin".to_string(),
            reporter_name: "Sari".to_string(),
            category: "AC".to_string(),
            sub_category: "AC tidak dingin".to_string(),
            description: "Ruang rapat lantai 2".to_string(),
            ..Default::default()
        }
    }

    /// Store wrapper that fails requests on demand.
    struct Flaky<S> {
        inner: S,
        fail: Cell<bool>,
    }

    impl<S: TicketStore> TicketStore for Flaky<S> {
        fn list_tickets(&self) -> Result<Vec<Ticket>> {
            if self.fail.get() {
                return Err(DeskError::Transport("connection reset".to_string()));
            }
            self.inner.list_tickets()
        }

        fn create_ticket(&self, draft: &TicketDraft, p: Priority) -> Result<Ticket> {
            if self.fail.get() {
                return Err(DeskError::Transport("connection reset".to_string()));
            }
            self.inner.create_ticket(draft, p)
        }

        fn update_ticket(&self, id: &str, update: &TicketUpdate) -> Result<Ticket> {
            if self.fail.get() {
                return Err(DeskError::Transport("connection reset".to_string()));
            }
            self.inner.update_ticket(id, update)
        }

        fn upload_attachment(&self, upload: &Upload) -> Result<Attachment> {
            if self.fail.get() {
                return Err(DeskError::Transport("connection reset".to_string()));
            }
            self.inner.upload_attachment(upload)
        }

        fn discard_attachment(&self, attachment: &Attachment) -> Result<()> {
            self.inner.discard_attachment(attachment)
        }
    }

    /// Store wrapper whose uploads work but whose ticket creation never does.
    struct RejectsTickets<S>(S);

    impl<S: TicketStore> TicketStore for RejectsTickets<S> {
        fn list_tickets(&self) -> Result<Vec<Ticket>> {
            self.0.list_tickets()
        }

        fn create_ticket(&self, _draft: &TicketDraft, _p: Priority) -> Result<Ticket> {
            Err(DeskError::Transport("connection reset".to_string()))
        }

        fn update_ticket(&self, id: &str, update: &TicketUpdate) -> Result<Ticket> {
            self.0.update_ticket(id, update)
        }

        fn upload_attachment(&self, upload: &Upload) -> Result<Attachment> {
            self.0.upload_attachment(upload)
        }

        fn discard_attachment(&self, attachment: &Attachment) -> Result<()> {
            self.0.discard_attachment(attachment)
        }
    }

    fn stored_files(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path().join("attachments"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn test_full_lifecycle_end_to_end() {
        let (db, _dir) = setup_store();
        let user_desk = Desk::new(db, reporter(), Priority::Medium);
        let created = user_desk.create(draft(), &[]).unwrap();
        assert_eq!(created.priority, Priority::Medium);
        assert_eq!(created.status, Status::Open);
        assert_eq!(created.unit, "Gedung A");

        let officer_desk = Desk::new(user_desk.store, officer(), Priority::Medium);
        officer_desk.refresh().unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 10, 23).unwrap();
        let t = officer_desk.apply(&created.id, Action::Schedule(date)).unwrap();
        assert_eq!(t.status, Status::Scheduled);
        assert_eq!(t.scheduled_at, Some(Utc.with_ymd_and_hms(2025, 10, 23, 0, 0, 0).unwrap()));

        let t = officer_desk.apply(&created.id, Action::Start).unwrap();
        assert_eq!(t.status, Status::InProgress);
        assert!(t.started_at.is_some());

        let t = officer_desk.apply(&created.id, Action::Complete).unwrap();
        assert_eq!(t.status, Status::Completed);
        assert!(t.completed_at.is_some());
        assert_eq!(t.assigned_officer.as_deref(), Some("budi"));

        let user_desk = Desk::new(officer_desk.store, reporter(), Priority::Medium);
        user_desk.refresh().unwrap();
        let t = user_desk
            .apply(&created.id, Action::SubmitReview(Ratings::uniform(4)))
            .unwrap();
        assert_eq!(t.status, Status::Closed);
        assert!(t.review.is_some());

        let aggregates = ratings::aggregate(&user_desk.tickets());
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].officer, "budi");
        for criterion in Criterion::ALL {
            assert_eq!(aggregates[0].average(criterion), 4.0);
        }
    }

    #[test]
    fn test_create_requires_every_field() {
        let (db, _dir) = setup_store();
        let desk = Desk::new(db, reporter(), Priority::Medium);
        let mut d = draft();
        d.description = "   ".to_string();
        let err = desk.create(d, &[]).unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));
        assert!(err.to_string().contains("description"));
        assert!(desk.store().list_tickets().unwrap().is_empty());
    }

    #[test]
    fn test_create_rejects_duplicate_attachment_ids() {
        let (db, _dir) = setup_store();
        let desk = Desk::new(db, reporter(), Priority::Medium);
        let mut d = draft();
        let a = Attachment {
            id: "x".to_string(),
            name: "foto.jpg".to_string(),
            url: "u".to_string(),
        };
        d.attachments = vec![a.clone(), a];
        assert!(matches!(desk.create(d, &[]), Err(DeskError::Validation(_))));
    }

    #[test]
    fn test_create_uploads_attachments_first() {
        let (db, _dir) = setup_store();
        let desk = Desk::new(db, reporter(), Priority::Medium);
        let uploads = vec![
            Upload {
                file_name: "foto.jpg".to_string(),
                bytes: vec![1, 2, 3],
            },
            Upload {
                file_name: "foto.jpg".to_string(),
                bytes: vec![4, 5],
            },
        ];
        let t = desk.create(draft(), &uploads).unwrap();
        assert_eq!(t.attachments.len(), 2);
        assert_ne!(t.attachments[0].id, t.attachments[1].id);
        assert_eq!(desk.tickets().len(), 1);
    }

    #[test]
    fn test_only_users_file_tickets() {
        let (db, _dir) = setup_store();
        let desk = Desk::new(db, officer(), Priority::Medium);
        assert!(matches!(
            desk.create(draft(), &[]),
            Err(DeskError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_create_failure_leaves_list_untouched() {
        let (db, _dir) = setup_store();
        let store = Flaky {
            inner: db,
            fail: Cell::new(true),
        };
        let desk = Desk::new(store, reporter(), Priority::Medium);
        let err = desk.create(draft(), &[]).unwrap_err();
        assert!(matches!(err, DeskError::Transport(_)));
        assert!(err.to_string().contains("try again"));
        assert!(desk.tickets().is_empty());
    }

    #[test]
    fn test_failed_create_discards_uploads() {
        let (db, dir) = setup_store();
        let desk = Desk::new(RejectsTickets(db), reporter(), Priority::Medium);
        let uploads = vec![
            Upload {
                file_name: "foto.jpg".to_string(),
                bytes: vec![1, 2, 3],
            },
            Upload {
                file_name: "denah.pdf".to_string(),
                bytes: vec![4, 5],
            },
        ];

        let err = desk.create(draft(), &uploads).unwrap_err();
        assert!(matches!(err, DeskError::Transport(_)));
        assert_eq!(stored_files(&dir), 0);
        assert!(desk.tickets().is_empty());
    }

    #[test]
    fn test_failed_upload_discards_earlier_ones() {
        let (db, dir) = setup_store();
        let desk = Desk::new(&db, reporter(), Priority::Medium);
        let uploads = vec![
            Upload {
                file_name: "foto.jpg".to_string(),
                bytes: vec![1, 2, 3],
            },
            // NUL cannot appear in a path, so writing this one fails
            Upload {
                file_name: "rusak\0.jpg".to_string(),
                bytes: vec![4, 5],
            },
        ];

        let err = desk.create(draft(), &uploads).unwrap_err();
        assert!(matches!(err, DeskError::Transport(_)));
        assert_eq!(stored_files(&dir), 0);
        assert!(db.list_tickets().unwrap().is_empty());
    }

    #[test]
    fn test_failed_update_preserves_state() {
        let (db, _dir) = setup_store();
        let created = Desk::new(&db, reporter(), Priority::Medium).create(draft(), &[]).unwrap();

        let store = Flaky {
            inner: db,
            fail: Cell::new(false),
        };
        let desk = Desk::new(store, officer(), Priority::Medium);
        desk.refresh().unwrap();
        let before = desk.tickets();

        desk.store().fail.set(true);
        let err = desk.apply(&created.id, Action::Start).unwrap_err();
        assert!(matches!(err, DeskError::Transport(_)));
        assert_eq!(desk.tickets(), before);
        assert!(!desk.is_in_flight(&created.id));

        // Retry once the store is back
        desk.store().fail.set(false);
        let t = desk.apply(&created.id, Action::Start).unwrap();
        assert_eq!(t.status, Status::InProgress);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_list() {
        let (db, _dir) = setup_store();
        Desk::new(&db, reporter(), Priority::Medium).create(draft(), &[]).unwrap();
        let store = Flaky {
            inner: db,
            fail: Cell::new(false),
        };
        let desk = Desk::new(store, officer(), Priority::Medium);
        assert_eq!(desk.refresh().unwrap(), 1);

        desk.store().fail.set(true);
        assert!(desk.refresh().is_err());
        assert_eq!(desk.tickets().len(), 1);
    }

    #[test]
    fn test_invalid_transition_never_reaches_store() {
        let (db, _dir) = setup_store();
        let created = Desk::new(&db, reporter(), Priority::Medium).create(draft(), &[]).unwrap();
        let store = Flaky {
            inner: db,
            fail: Cell::new(false),
        };
        let desk = Desk::new(store, officer(), Priority::Medium);
        desk.refresh().unwrap();

        // A store failure would surface as Transport; planning fails first
        desk.store().fail.set(true);
        let err = desk.apply(&created.id, Action::Complete).unwrap_err();
        assert!(matches!(err, DeskError::InvalidTransition { .. }));
    }

    #[test]
    fn test_second_action_while_in_flight_is_refused() {
        let (db, _dir) = setup_store();
        let a = Desk::new(&db, reporter(), Priority::Medium).create(draft(), &[]).unwrap();
        let b = Desk::new(&db, reporter(), Priority::Medium).create(draft(), &[]).unwrap();
        let desk = Desk::new(&db, officer(), Priority::Medium);
        desk.refresh().unwrap();

        let guard = desk.claim(&a.id).unwrap();
        assert!(matches!(desk.apply(&a.id, Action::Start), Err(DeskError::Busy(_))));
        // Other tickets are not blocked
        assert!(desk.apply(&b.id, Action::Start).is_ok());
        drop(guard);

        assert!(desk.apply(&a.id, Action::Start).is_ok());
    }

    #[test]
    fn test_unknown_ticket() {
        let (db, _dir) = setup_store();
        let desk = Desk::new(db, officer(), Priority::Medium);
        assert!(matches!(desk.apply("404", Action::Start), Err(DeskError::NotFound(_))));
    }
}
