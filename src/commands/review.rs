use anyhow::{bail, Result};
use clap::Args;

use ticketdesk::desk::Desk;
use ticketdesk::lifecycle::Action;
use ticketdesk::models::{Criterion, Ratings, Role, Score};
use ticketdesk::store::TicketStore;
use ticketdesk::views;

use super::ticket_id;

/// Star ratings (1-5) and optional comments for each criterion.
#[derive(Args, Debug, Default)]
pub struct ScoreArgs {
    /// Attitude and work ethic
    #[arg(long)]
    pub attitude: Option<u8>,
    #[arg(long)]
    pub attitude_comment: Option<String>,

    /// Neatness and cleanliness
    #[arg(long)]
    pub neatness: Option<u8>,
    #[arg(long)]
    pub neatness_comment: Option<String>,

    /// Quality of the result
    #[arg(long)]
    pub quality: Option<u8>,
    #[arg(long)]
    pub quality_comment: Option<String>,

    /// Speed and punctuality
    #[arg(long)]
    pub speed: Option<u8>,
    #[arg(long)]
    pub speed_comment: Option<String>,

    /// Explanation and communication
    #[arg(long)]
    pub communication: Option<u8>,
    #[arg(long)]
    pub communication_comment: Option<String>,
}

impl ScoreArgs {
    /// Unrated criteria come through as zero stars and fail validation.
    pub fn into_ratings(self) -> Ratings {
        let score = |stars: Option<u8>, comment: Option<String>| {
            Score::new(stars.unwrap_or(0), comment.unwrap_or_default().trim())
        };
        let mut ratings = Ratings::default();
        *ratings.score_mut(Criterion::Attitude) = score(self.attitude, self.attitude_comment);
        *ratings.score_mut(Criterion::Neatness) = score(self.neatness, self.neatness_comment);
        *ratings.score_mut(Criterion::Quality) = score(self.quality, self.quality_comment);
        *ratings.score_mut(Criterion::Speed) = score(self.speed, self.speed_comment);
        *ratings.score_mut(Criterion::Communication) =
            score(self.communication, self.communication_comment);
        ratings
    }
}

pub fn run<S: TicketStore>(desk: &Desk<S>, id: &str, ratings: Ratings) -> Result<()> {
    let ticket = desk.apply(ticket_id(id), Action::SubmitReview(ratings))?;
    println!("Reviewed ticket #{}, now {}", ticket.id, ticket.status);
    Ok(())
}

pub fn pending<S: TicketStore>(desk: &Desk<S>) -> Result<()> {
    let user = desk.user();
    if user.role != Role::User {
        bail!("Only user accounts have tickets to review");
    }

    let tickets = desk.tickets();
    let waiting = views::awaiting_review(&tickets, &user.username);
    if waiting.is_empty() {
        println!("No completed tickets waiting for your review.");
        return Ok(());
    }

    println!("Waiting for your review:");
    for ticket in waiting {
        let officer = ticket.assigned_officer.as_deref().unwrap_or("-");
        println!("  #{} {} (officer: {})", ticket.id, ticket.title, officer);
    }
    Ok(())
}
