use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use ticketdesk::config::{Config, CONFIG_FILE, DATABASE_FILE, DESK_DIR};
use ticketdesk::db::Database;

pub fn run(path: &Path) -> Result<()> {
    let desk_dir = path.join(DESK_DIR);

    if desk_dir.join(DATABASE_FILE).exists() {
        println!("Already initialized at {}", desk_dir.display());
        return Ok(());
    }

    fs::create_dir_all(&desk_dir).context("Failed to create .ticketdesk directory")?;

    let config = Config::load(&desk_dir)?;
    if !desk_dir.join(CONFIG_FILE).exists() {
        config.save(&desk_dir)?;
    }

    let attachments = config.attachments_path(&desk_dir);
    fs::create_dir_all(&attachments)
        .with_context(|| format!("Failed to create {}", attachments.display()))?;

    Database::open(&desk_dir.join(DATABASE_FILE), &attachments).context("Failed to create database")?;
    println!("Created {}", desk_dir.display());

    println!("ticketdesk initialized successfully!");
    println!("\nNext steps:");
    println!("  export TICKETDESK_USER=<unit> TICKETDESK_ROLE=user");
    println!("  ticketdesk create \"AC bocor\" -r <name> -c AC -s \"AC bocor\" -d <details>");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use ticketdesk::models::Priority;
    use ticketdesk::store::TicketStore;

    #[test]
    fn test_run_fresh_init() {
        let dir = tempdir().unwrap();
        run(dir.path()).unwrap();

        let desk_dir = dir.path().join(DESK_DIR);
        assert!(desk_dir.join(DATABASE_FILE).exists());
        assert!(desk_dir.join(CONFIG_FILE).exists());
        assert!(desk_dir.join("attachments").is_dir());
    }

    #[test]
    fn test_run_twice_is_harmless() {
        let dir = tempdir().unwrap();
        run(dir.path()).unwrap();
        run(dir.path()).unwrap();
        assert!(dir.path().join(DESK_DIR).join(DATABASE_FILE).exists());
    }

    #[test]
    fn test_existing_config_is_kept() {
        let dir = tempdir().unwrap();
        let desk_dir = dir.path().join(DESK_DIR);
        fs::create_dir_all(&desk_dir).unwrap();
        fs::write(desk_dir.join(CONFIG_FILE), r#"{ "default_priority": "High" }"#).unwrap();

        run(dir.path()).unwrap();

        let config = Config::load(&desk_dir).unwrap();
        assert_eq!(config.default_priority, Priority::High);
    }

    #[test]
    fn test_database_usable() {
        let dir = tempdir().unwrap();
        run(dir.path()).unwrap();

        let desk_dir = dir.path().join(DESK_DIR);
        let db = Database::open(&desk_dir.join(DATABASE_FILE), &desk_dir.join("attachments")).unwrap();
        assert!(db.list_tickets().unwrap().is_empty());
    }
}
