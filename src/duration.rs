//! Human-readable elapsed time between two instants.
//!
//! Units are rendered with the words the desk's users read on screen:
//! `hari` (days), `jam` (hours), `menit` (minutes), `detik` (seconds).

use chrono::{DateTime, Utc};
use std::fmt;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Whole-unit breakdown of a non-negative span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Elapsed {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    total_ms: i64,
}

impl Elapsed {
    /// Span from `start` to `end`; an `end` before `start` is treated as zero.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let total_ms = end.signed_duration_since(start).num_milliseconds().max(0);
        Self::from_millis(total_ms)
    }

    pub fn from_millis(total_ms: i64) -> Self {
        let total_ms = total_ms.max(0);
        Elapsed {
            days: total_ms / MS_PER_DAY,
            hours: (total_ms % MS_PER_DAY) / MS_PER_HOUR,
            minutes: (total_ms % MS_PER_HOUR) / MS_PER_MINUTE,
            seconds: total_ms / MS_PER_SECOND,
            total_ms,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total_ms == 0
    }

    /// Render with `zero` used for an empty span.
    pub fn render(&self, zero: &str) -> String {
        if self.is_zero() {
            return zero.to_string();
        }

        let mut parts = Vec::with_capacity(3);
        if self.days > 0 {
            parts.push(format!("{} hari", self.days));
        }
        if self.hours > 0 {
            parts.push(format!("{} jam", self.hours));
        }
        if self.minutes > 0 {
            parts.push(format!("{} menit", self.minutes));
        }

        if parts.is_empty() {
            // Under a minute: whole seconds only
            return format!("{} detik", self.seconds);
        }
        parts.join(" ")
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(WORK_ZERO))
    }
}

const WORK_ZERO: &str = "0 detik";
const INSTANT: &str = "seketika";

/// Total time a ticket took, from filing to completion.
pub fn work_duration(created: DateTime<Utc>, completed: DateTime<Utc>) -> String {
    Elapsed::between(created, completed).render(WORK_ZERO)
}

/// Time a user took to review after completion.
pub fn review_delay(completed: DateTime<Utc>, reviewed: DateTime<Utc>) -> String {
    Elapsed::between(completed, reviewed).render(INSTANT)
}
