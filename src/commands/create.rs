use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use ticketdesk::desk::Desk;
use ticketdesk::models::{TicketDraft, Upload};
use ticketdesk::store::TicketStore;

/// Categories offered to reporters and the sub-categories under each.
pub const CATEGORIES: [(&str, &[&str]); 4] = [
    ("AC", &["AC tidak dingin", "AC berisik", "AC bocor", "Lainnya"]),
    ("Kelistrikan", &["Lampu mati", "Stop kontak rusak", "Sekring putus", "Lainnya"]),
    ("Perabotan", &["Kursi rusak", "Meja rusak", "Lemari rusak", "Lainnya"]),
    ("Saluran Air", &["Wastafel mampet", "Keran bocor", "Toilet mampet", "Lainnya"]),
];

pub struct NewTicket<'a> {
    pub title: &'a str,
    pub reporter: &'a str,
    pub category: &'a str,
    pub sub_category: &'a str,
    pub description: &'a str,
}

pub fn validate_category(category: &str, sub_category: &str) -> Result<()> {
    let Some((_, subs)) = CATEGORIES.iter().find(|(name, _)| *name == category) else {
        let names: Vec<&str> = CATEGORIES.iter().map(|(name, _)| *name).collect();
        bail!(
            "Invalid category '{}'. Must be one of: {}",
            category,
            names.join(", ")
        );
    };
    if !subs.contains(&sub_category) {
        bail!(
            "Invalid sub-category '{}' for {}. Must be one of: {}",
            sub_category,
            category,
            subs.join(", ")
        );
    }
    Ok(())
}

fn read_upload(path: &Path) -> Result<Upload> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Upload { file_name, bytes })
}

pub fn run<S: TicketStore>(desk: &Desk<S>, ticket: NewTicket<'_>, attach: &[PathBuf]) -> Result<()> {
    validate_category(ticket.category, ticket.sub_category)?;

    let uploads = attach.iter().map(|p| read_upload(p)).collect::<Result<Vec<_>>>()?;
    let draft = TicketDraft {
        title: ticket.title.trim().to_string(),
        reporter_name: ticket.reporter.trim().to_string(),
        category: ticket.category.to_string(),
        sub_category: ticket.sub_category.to_string(),
        description: ticket.description.trim().to_string(),
        ..Default::default()
    };

    let created = desk.create(draft, &uploads)?;
    println!("Created ticket #{} ({})", created.id, created.priority);
    for attachment in &created.attachments {
        println!("  attached {}", attachment.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{desk_as, setup_db};
    use ticketdesk::models::{Role, Status};

    fn new_ticket<'a>(title: &'a str) -> NewTicket<'a> {
        NewTicket {
            title,
            reporter: "Sari",
            category: "Kelistrikan",
            sub_category: "Lampu mati",
            description: "Lampu koridor lantai 2 mati",
        }
    }

    #[test]
    fn test_validate_category_known_pairs() {
        for (category, subs) in CATEGORIES {
            for sub in subs {
                assert!(validate_category(category, sub).is_ok());
            }
        }
    }

    #[test]
    fn test_validate_category_rejects_mismatch() {
        assert!(validate_category("Furniture", "Kursi rusak").is_err());
        let err = validate_category("AC", "Lampu mati").unwrap_err();
        assert!(err.to_string().contains("AC tidak dingin"));
    }

    #[test]
    fn test_run_creates_ticket_for_unit() {
        let (db, _dir) = setup_db();
        let desk = desk_as(&db, "Keuangan", Role::User);

        run(&desk, new_ticket("Lampu mati"), &[]).unwrap();

        let tickets = db.list_tickets().unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].unit, "Keuangan");
        assert_eq!(tickets[0].status, Status::Open);
        assert_eq!(tickets[0].reporter_name, "Sari");
    }

    #[test]
    fn test_run_attaches_files() {
        let (db, dir) = setup_db();
        let photo = dir.path().join("lampu.jpg");
        fs::write(&photo, b"jpeg").unwrap();
        let desk = desk_as(&db, "Keuangan", Role::User);

        run(&desk, new_ticket("Lampu mati"), &[photo]).unwrap();

        let ticket = &db.list_tickets().unwrap()[0];
        assert_eq!(ticket.attachments.len(), 1);
        assert_eq!(ticket.attachments[0].name, "lampu.jpg");
    }

    #[test]
    fn test_run_missing_attachment_creates_nothing() {
        let (db, dir) = setup_db();
        let desk = desk_as(&db, "Keuangan", Role::User);

        let result = run(&desk, new_ticket("Lampu mati"), &[dir.path().join("nope.jpg")]);
        assert!(result.is_err());
        assert!(db.list_tickets().unwrap().is_empty());
    }

    #[test]
    fn test_run_blank_title_rejected() {
        let (db, _dir) = setup_db();
        let desk = desk_as(&db, "Keuangan", Role::User);

        let err = run(&desk, new_ticket("   "), &[]).unwrap_err();
        assert!(err.to_string().contains("title"));
        assert!(db.list_tickets().unwrap().is_empty());
    }

    #[test]
    fn test_run_officer_cannot_create() {
        let (db, _dir) = setup_db();
        let desk = desk_as(&db, "budi", Role::Officer);
        assert!(run(&desk, new_ticket("Lampu mati"), &[]).is_err());
    }
}
