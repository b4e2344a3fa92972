use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a ticket.
///
/// ```text
/// Open → Scheduled → InProgress → Completed → Closed
///   └──────┴────────────┴── cancel ──────────→ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Open,
    Scheduled,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Closed,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Open,
        Status::Scheduled,
        Status::InProgress,
        Status::Completed,
        Status::Closed,
    ];

    /// Wire representation, as stored in the ticket sheet.
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::Scheduled => "Scheduled",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
            Status::Closed => "Closed",
        }
    }

    /// Open, Scheduled and InProgress tickets still need an officer.
    pub const fn is_live(self) -> bool {
        matches!(self, Status::Open | Status::Scheduled | Status::InProgress)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "open" => Ok(Status::Open),
            "scheduled" => Ok(Status::Scheduled),
            "in progress" | "inprogress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            "closed" => Ok(Status::Closed),
            _ => Err(format!(
                "Invalid status '{}'. Must be one of: open, scheduled, in-progress, completed, closed",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Sort weight, higher is more urgent.
    pub const fn weight(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!(
                "Invalid priority '{}'. Must be one of: low, medium, high",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Officer,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Officer => "Officer",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "officer" => Ok(Role::Officer),
            "admin" => Ok(Role::Admin),
            _ => Err(format!(
                "Invalid role '{}'. Must be one of: user, officer, admin",
                s
            )),
        }
    }
}

/// The signed-in actor. For a `User` the username is their unit; for an
/// `Officer` it is the identifier written to `assigned_officer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Raw file handed to the store before a ticket is created.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One of the five rated aspects of an officer's work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Attitude,
    Neatness,
    Quality,
    Speed,
    Communication,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Attitude,
        Criterion::Neatness,
        Criterion::Quality,
        Criterion::Speed,
        Criterion::Communication,
    ];

    /// Field name used by the ticket sheet; the comment lives under
    /// `<key>Comment`.
    pub const fn key(self) -> &'static str {
        match self {
            Criterion::Attitude => "attitude",
            Criterion::Neatness => "neatness",
            Criterion::Quality => "quality",
            Criterion::Speed => "speed",
            Criterion::Communication => "communication",
        }
    }

    pub const fn comment_key(self) -> &'static str {
        match self {
            Criterion::Attitude => "attitudeComment",
            Criterion::Neatness => "neatnessComment",
            Criterion::Quality => "qualityComment",
            Criterion::Speed => "speedComment",
            Criterion::Communication => "communicationComment",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Criterion::Attitude => "Sikap & Etika Kerja",
            Criterion::Neatness => "Kerapihan & Kebersihan",
            Criterion::Quality => "Kualitas Hasil Pekerjaan",
            Criterion::Speed => "Kecepatan & Ketepatan Waktu",
            Criterion::Communication => "Penjelasan & Komunikasi",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    /// 1 to 5 once validated; 0 means not rated yet.
    pub stars: u8,
    pub comment: String,
}

impl Score {
    pub fn new(stars: u8, comment: impl Into<String>) -> Self {
        Self {
            stars,
            comment: comment.into(),
        }
    }
}

/// Scores as entered by the reviewing user, before the desk stamps them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ratings {
    pub attitude: Score,
    pub neatness: Score,
    pub quality: Score,
    pub speed: Score,
    pub communication: Score,
}

impl Ratings {
    /// Same stars and no comments for every criterion.
    pub fn uniform(stars: u8) -> Self {
        let mut ratings = Ratings::default();
        for criterion in Criterion::ALL {
            ratings.score_mut(criterion).stars = stars;
        }
        ratings
    }

    pub fn score(&self, criterion: Criterion) -> &Score {
        match criterion {
            Criterion::Attitude => &self.attitude,
            Criterion::Neatness => &self.neatness,
            Criterion::Quality => &self.quality,
            Criterion::Speed => &self.speed,
            Criterion::Communication => &self.communication,
        }
    }

    pub fn score_mut(&mut self, criterion: Criterion) -> &mut Score {
        match criterion {
            Criterion::Attitude => &mut self.attitude,
            Criterion::Neatness => &mut self.neatness,
            Criterion::Quality => &mut self.quality,
            Criterion::Speed => &mut self.speed,
            Criterion::Communication => &mut self.communication,
        }
    }

    /// First criterion that is unrated or outside 1..=5.
    pub fn first_invalid(&self) -> Option<Criterion> {
        Criterion::ALL
            .into_iter()
            .find(|c| !(1..=5).contains(&self.score(*c).stars))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub ratings: Ratings,
    pub reviewed_at: DateTime<Utc>,
}

impl Review {
    pub fn score(&self, criterion: Criterion) -> &Score {
        self.ratings.score(criterion)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub reporter_name: String,
    pub unit: String,
    pub category: String,
    pub sub_category: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_officer: Option<String>,
    pub attachments: Vec<Attachment>,
    pub review: Option<Review>,
}

/// Fields a user supplies when filing a ticket. The store assigns the id,
/// status, priority and creation time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketDraft {
    pub title: String,
    pub reporter_name: String,
    pub unit: String,
    pub category: String,
    pub sub_category: String,
    pub description: String,
    pub attachments: Vec<Attachment>,
}

/// Partial update sent to the store. Produced by the lifecycle planner, one
/// transition per update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketUpdate {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_officer: Option<String>,
    pub review: Option<Review>,
}

impl TicketUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TicketUpdate::default()
    }

    /// Write the supplied fields onto `ticket`, leaving the rest untouched.
    pub fn apply_to(&self, ticket: &mut Ticket) {
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(priority) = self.priority {
            ticket.priority = priority;
        }
        if let Some(at) = self.scheduled_at {
            ticket.scheduled_at = Some(at);
        }
        if let Some(at) = self.started_at {
            ticket.started_at = Some(at);
        }
        if let Some(at) = self.completed_at {
            ticket.completed_at = Some(at);
        }
        if let Some(officer) = &self.assigned_officer {
            ticket.assigned_officer = Some(officer.clone());
        }
        if let Some(review) = &self.review {
            ticket.review = Some(review.clone());
        }
    }
}
