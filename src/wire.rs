//! Ticket payloads as exchanged with the ticket store.
//!
//! The store is spreadsheet-shaped: one camelCase JSON object per ticket,
//! with attachments and reviews sometimes arriving as JSON *text* in a cell
//! rather than as structured values. Decoding is deliberately forgiving.
//! A bad optional cell degrades to a default and logs a warning; only a
//! record without an id or with an unknown status is dropped, and never the
//! whole list.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::{DeskError, Result};
use crate::models::{Attachment, Criterion, Priority, Ratings, Review, Status, Ticket};

/// Decode every record that can be decoded, skipping the rest.
pub fn decode_tickets(values: &[Value]) -> Vec<Ticket> {
    values
        .iter()
        .enumerate()
        .filter_map(|(row, value)| match decode_ticket(value) {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                warn!(row, error = %e, "skipping undecodable ticket record");
                None
            }
        })
        .collect()
}

pub fn decode_ticket(value: &Value) -> Result<Ticket> {
    let obj = value
        .as_object()
        .ok_or_else(|| DeskError::Decode("ticket record is not an object".to_string()))?;

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(DeskError::Decode("ticket record has no id".to_string())),
    };

    let status = match obj.get("status").and_then(Value::as_str) {
        Some(s) => s
            .parse::<Status>()
            .map_err(|_| DeskError::Decode(format!("ticket #{} has unknown status '{}'", id, s)))?,
        None => return Err(DeskError::Decode(format!("ticket #{} has no status", id))),
    };

    let priority = match obj.get("priority").and_then(Value::as_str) {
        Some(p) => p.parse::<Priority>().unwrap_or_else(|_| {
            warn!(ticket = %id, priority = p, "unknown priority, using Medium");
            Priority::Medium
        }),
        None => Priority::Medium,
    };

    let created_at = obj
        .get("createdAt")
        .and_then(|v| decode_timestamp(v, &id, "createdAt"))
        .unwrap_or_else(|| {
            warn!(ticket = %id, "missing createdAt, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        });

    let assigned_officer = text(obj, "assignedOfficer");

    // Reviews only exist once the work is done
    let review = obj.get("review").and_then(|v| decode_review(v, &id));
    let review = match review {
        Some(_) if !matches!(status, Status::Completed | Status::Closed) => {
            warn!(ticket = %id, %status, "review on unfinished ticket, dropping it");
            None
        }
        review => review,
    };

    Ok(Ticket {
        title: text(obj, "title").unwrap_or_default(),
        reporter_name: text(obj, "reporterName").unwrap_or_default(),
        unit: text(obj, "unit").unwrap_or_default(),
        category: text(obj, "category").unwrap_or_default(),
        sub_category: text(obj, "subCategory").unwrap_or_default(),
        description: text(obj, "description").unwrap_or_default(),
        status,
        priority,
        created_at,
        scheduled_at: optional_timestamp(obj, "scheduledAt", &id),
        started_at: optional_timestamp(obj, "startedAt", &id),
        completed_at: optional_timestamp(obj, "completedAt", &id),
        assigned_officer,
        attachments: obj
            .get("attachments")
            .map(|v| decode_attachments(v, &id))
            .unwrap_or_default(),
        review,
        id,
    })
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn optional_timestamp(obj: &Map<String, Value>, key: &str, id: &str) -> Option<DateTime<Utc>> {
    obj.get(key).and_then(|v| decode_timestamp(v, id, key))
}

/// Accepts RFC 3339, `YYYY-MM-DD`, naive `YYYY-MM-DD HH:MM:SS` (taken as
/// UTC) or epoch milliseconds. Blank cells are `None` without a warning;
/// instants outside years 0000-9999 are treated as malformed.
pub fn decode_timestamp(value: &Value, id: &str, field: &str) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::Null => return None,
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => parse_timestamp(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
    // RFC 3339 only has four-digit years; anything outside would not survive encoding
    .filter(|at| (0..=9999).contains(&at.year()));

    if parsed.is_none() {
        warn!(ticket = %id, field, value = %value, "malformed timestamp, ignoring");
    }
    parsed
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(crate::lifecycle::schedule_instant)
}

/// Attachments may arrive as a list or as a cell holding a JSON list.
/// Anything undecodable becomes an empty list.
pub fn decode_attachments(value: &Value, id: &str) -> Vec<Attachment> {
    let items = match value {
        Value::Null => return Vec::new(),
        Value::Array(items) => items.clone(),
        Value::String(s) if s.trim().is_empty() => return Vec::new(),
        Value::String(s) if s.trim_start().starts_with('[') => {
            match serde_json::from_str::<Vec<Value>>(s) {
                Ok(items) => items,
                Err(e) => {
                    warn!(ticket = %id, error = %e, "failed to parse attachments, using none");
                    return Vec::new();
                }
            }
        }
        other => {
            warn!(ticket = %id, value = %other, "attachments are not a list, using none");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Attachment>(item) {
            Ok(attachment) => Some(attachment),
            Err(e) => {
                warn!(ticket = %id, error = %e, "dropping malformed attachment");
                None
            }
        })
        .collect()
}

/// Reviews use flat `attitude`, `attitudeComment`, ..., `reviewedAt` fields,
/// either as an object or as JSON text.
pub fn decode_review(value: &Value, id: &str) -> Option<Review> {
    let parsed;
    let obj = match value {
        Value::Null => return None,
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s).ok();
            parsed.as_ref().and_then(Value::as_object)
        }
        Value::Object(obj) => Some(obj),
        _ => None,
    };
    let Some(obj) = obj else {
        warn!(ticket = %id, "review is not an object, dropping it");
        return None;
    };

    let mut ratings = Ratings::default();
    for criterion in Criterion::ALL {
        let stars = obj.get(criterion.key()).and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_f64().map(|f| f.round() as u64))
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        });
        let Some(stars) = stars.filter(|s| (1..=5).contains(s)) else {
            warn!(ticket = %id, criterion = criterion.key(), "review score missing or out of range, dropping review");
            return None;
        };
        let score = ratings.score_mut(criterion);
        score.stars = stars as u8;
        score.comment = obj
            .get(criterion.comment_key())
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
    }

    let reviewed_at = obj
        .get("reviewedAt")
        .and_then(|v| decode_timestamp(v, id, "reviewedAt"))
        .unwrap_or_else(|| {
            warn!(ticket = %id, "review has no reviewedAt, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        });

    Some(Review {
        ratings,
        reviewed_at,
    })
}

pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn encode_attachments(attachments: &[Attachment]) -> String {
    Value::Array(
        attachments
            .iter()
            .map(|a| json!({ "id": a.id, "name": a.name, "url": a.url }))
            .collect(),
    )
    .to_string()
}

pub fn encode_review(review: &Review) -> Value {
    let mut obj = Map::new();
    for criterion in Criterion::ALL {
        let score = review.score(criterion);
        obj.insert(criterion.key().to_string(), json!(score.stars));
        obj.insert(criterion.comment_key().to_string(), json!(score.comment));
    }
    obj.insert("reviewedAt".to_string(), json!(encode_timestamp(review.reviewed_at)));
    Value::Object(obj)
}

pub fn encode_ticket(ticket: &Ticket) -> Value {
    let stamp = |at: Option<DateTime<Utc>>| at.map(encode_timestamp);
    json!({
        "id": ticket.id,
        "title": ticket.title,
        "reporterName": ticket.reporter_name,
        "unit": ticket.unit,
        "category": ticket.category,
        "subCategory": ticket.sub_category,
        "description": ticket.description,
        "status": ticket.status.as_str(),
        "priority": ticket.priority.as_str(),
        "createdAt": encode_timestamp(ticket.created_at),
        "scheduledAt": stamp(ticket.scheduled_at),
        "startedAt": stamp(ticket.started_at),
        "completedAt": stamp(ticket.completed_at),
        "assignedOfficer": ticket.assigned_officer,
        "attachments": ticket.attachments,
        "review": ticket.review.as_ref().map(encode_review),
    })
}
