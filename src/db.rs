use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DeskError, Result};
use crate::models::{Attachment, Priority, Status, Ticket, TicketDraft, TicketUpdate, Upload};
use crate::store::TicketStore;
use crate::wire;

const SCHEMA_VERSION: i32 = 1;

const TICKET_COLUMNS: &str = "id, title, reporter_name, unit, category, sub_category, description, status, priority, created_at, scheduled_at, started_at, completed_at, assigned_officer, attachments, review";

/// Local ticket sheet. Rows keep the sheet's cell encoding (attachments and
/// reviews as JSON text) and are read back through the wire decoder.
pub struct Database {
    conn: Connection,
    attachments_dir: PathBuf,
}

impl Database {
    pub fn open(path: &Path, attachments_dir: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database {
            conn,
            attachments_dir: attachments_dir.to_path_buf(),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap_or(0);

        if version < SCHEMA_VERSION {
            self.conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS tickets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    reporter_name TEXT NOT NULL,
                    unit TEXT NOT NULL,
                    category TEXT NOT NULL,
                    sub_category TEXT NOT NULL,
                    description TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'Open',
                    priority TEXT NOT NULL DEFAULT 'Medium',
                    created_at TEXT NOT NULL,
                    scheduled_at TEXT,
                    started_at TEXT,
                    completed_at TEXT,
                    assigned_officer TEXT,
                    attachments TEXT NOT NULL DEFAULT '[]',
                    review TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
                CREATE INDEX IF NOT EXISTS idx_tickets_unit ON tickets(unit);
                CREATE INDEX IF NOT EXISTS idx_tickets_officer ON tickets(assigned_officer);
                "#,
            )?;

            self.conn
                .execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
        }

        Ok(())
    }

    fn get_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        let sql = format!("SELECT {} FROM tickets WHERE id = ?1", TICKET_COLUMNS);
        let value = self
            .conn
            .query_row(&sql, [id], row_to_value)
            .optional()?;

        value.map(|v| wire::decode_ticket(&v)).transpose()
    }
}

/// A row as the sheet would send it.
fn row_to_value(row: &Row<'_>) -> rusqlite::Result<Value> {
    Ok(json!({
        "id": row.get::<_, i64>(0)?.to_string(),
        "title": row.get::<_, String>(1)?,
        "reporterName": row.get::<_, String>(2)?,
        "unit": row.get::<_, String>(3)?,
        "category": row.get::<_, String>(4)?,
        "subCategory": row.get::<_, String>(5)?,
        "description": row.get::<_, String>(6)?,
        "status": row.get::<_, String>(7)?,
        "priority": row.get::<_, String>(8)?,
        "createdAt": row.get::<_, String>(9)?,
        "scheduledAt": row.get::<_, Option<String>>(10)?,
        "startedAt": row.get::<_, Option<String>>(11)?,
        "completedAt": row.get::<_, Option<String>>(12)?,
        "assignedOfficer": row.get::<_, Option<String>>(13)?,
        "attachments": row.get::<_, String>(14)?,
        "review": row.get::<_, Option<String>>(15)?,
    }))
}

impl Database {
    /// Where an upload lives on disk: `<attachments>/<id>-<name>`, with path
    /// separators in the name flattened.
    fn attachment_path(&self, id: &str, file_name: &str) -> PathBuf {
        let safe_name: String = file_name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.attachments_dir.join(format!("{}-{}", id, safe_name))
    }
}

fn parse_id(id: &str) -> Result<i64> {
    id.trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| DeskError::NotFound(id.to_string()))
}

impl TicketStore for Database {
    fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let sql = format!("SELECT {} FROM tickets ORDER BY id", TICKET_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_value)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(count = rows.len(), "listed ticket rows");
        Ok(wire::decode_tickets(&rows))
    }

    fn create_ticket(&self, draft: &TicketDraft, default_priority: Priority) -> Result<Ticket> {
        let now = wire::encode_timestamp(Utc::now());
        self.conn.execute(
            "INSERT INTO tickets (title, reporter_name, unit, category, sub_category, description, status, priority, created_at, attachments) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                draft.title,
                draft.reporter_name,
                draft.unit,
                draft.category,
                draft.sub_category,
                draft.description,
                Status::Open.as_str(),
                default_priority.as_str(),
                now,
                wire::encode_attachments(&draft.attachments),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, "inserted ticket row");

        self.get_ticket(id)?
            .ok_or_else(|| DeskError::Transport(format!("ticket #{} vanished after insert", id)))
    }

    fn update_ticket(&self, id: &str, update: &TicketUpdate) -> Result<Ticket> {
        let row_id = parse_id(id)?;
        let mut updates: Vec<String> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        let mut set = |column: &str, value: Box<dyn rusqlite::ToSql>| {
            params_vec.push(value);
            updates.push(format!("{} = ?{}", column, params_vec.len()));
        };

        if let Some(status) = update.status {
            set("status", Box::new(status.as_str()));
        }
        if let Some(priority) = update.priority {
            set("priority", Box::new(priority.as_str()));
        }
        if let Some(at) = update.scheduled_at {
            set("scheduled_at", Box::new(wire::encode_timestamp(at)));
        }
        if let Some(at) = update.started_at {
            set("started_at", Box::new(wire::encode_timestamp(at)));
        }
        if let Some(at) = update.completed_at {
            set("completed_at", Box::new(wire::encode_timestamp(at)));
        }
        if let Some(officer) = &update.assigned_officer {
            set("assigned_officer", Box::new(officer.clone()));
        }
        if let Some(review) = &update.review {
            set("review", Box::new(wire::encode_review(review).to_string()));
        }

        if updates.is_empty() {
            return Err(DeskError::Validation("Nothing to update".to_string()));
        }

        params_vec.push(Box::new(row_id));
        let sql = format!(
            "UPDATE tickets SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = self.conn.execute(&sql, params_refs.as_slice())?;
        if rows == 0 {
            return Err(DeskError::NotFound(id.to_string()));
        }
        debug!(id = row_id, fields = updates.len(), "updated ticket row");

        self.get_ticket(row_id)?
            .ok_or_else(|| DeskError::NotFound(id.to_string()))
    }

    fn upload_attachment(&self, upload: &Upload) -> Result<Attachment> {
        fs::create_dir_all(&self.attachments_dir)?;

        let id = Uuid::new_v4().to_string();
        let path = self.attachment_path(&id, &upload.file_name);
        fs::write(&path, &upload.bytes)?;

        let path = path.canonicalize().unwrap_or(path);
        debug!(%id, path = %path.display(), "stored attachment");
        Ok(Attachment {
            id,
            name: upload.file_name.clone(),
            url: format!("file://{}", path.display()),
        })
    }

    fn discard_attachment(&self, attachment: &Attachment) -> Result<()> {
        let path = self.attachment_path(&attachment.id, &attachment.name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(id = %attachment.id, "discarded attachment");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
