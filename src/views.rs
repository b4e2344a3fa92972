//! Per-role ticket lists.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::duration::work_duration;
use crate::models::{Status, Ticket};

/// User-side filter on their own tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReviewFilter {
    #[default]
    All,
    Reviewed,
    Unreviewed,
}

/// Admin monitoring boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Board {
    /// Open, Scheduled and In Progress
    #[default]
    Live,
    /// Completed and Closed
    Finished,
}

fn newest_first<'a>(mut tickets: Vec<&'a Ticket>) -> Vec<&'a Ticket> {
    tickets.sort_by_key(|t| Reverse(t.created_at));
    tickets
}

/// Tickets filed by `unit`, newest first.
pub fn user_tickets<'a>(tickets: &'a [Ticket], unit: &str, filter: ReviewFilter) -> Vec<&'a Ticket> {
    newest_first(
        tickets
            .iter()
            .filter(|t| t.unit == unit)
            .filter(|t| match filter {
                ReviewFilter::All => true,
                ReviewFilter::Reviewed => t.review.is_some(),
                ReviewFilter::Unreviewed => t.review.is_none(),
            })
            .collect(),
    )
}

/// Completed tickets of `unit` still waiting for a review.
pub fn awaiting_review<'a>(tickets: &'a [Ticket], unit: &str) -> Vec<&'a Ticket> {
    tickets
        .iter()
        .filter(|t| t.unit == unit && t.status == Status::Completed && t.review.is_none())
        .collect()
}

/// Everything an officer can act on, in store order.
pub fn officer_queue<'a>(tickets: &'a [Ticket], status: Option<Status>) -> Vec<&'a Ticket> {
    tickets
        .iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .collect()
}

pub fn monitoring(tickets: &[Ticket], board: Board) -> Vec<&Ticket> {
    newest_first(
        tickets
            .iter()
            .filter(|t| match board {
                Board::Live => t.status.is_live(),
                Board::Finished => !t.status.is_live(),
            })
            .collect(),
    )
}

/// Total time from filing to completion of a finished ticket.
pub fn time_taken(ticket: &Ticket) -> Option<String> {
    if ticket.status.is_live() {
        return None;
    }
    ticket
        .completed_at
        .map(|completed| work_duration(ticket.created_at, completed))
}

/// Suggested work order for open and scheduled tickets: most urgent first,
/// then kept together by unit to cut walking, then by category.
pub fn suggest_schedule(tickets: &[Ticket]) -> Vec<&Ticket> {
    let mut pending: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| matches!(t.status, Status::Open | Status::Scheduled))
        .collect();

    // Units are visited in order of their most urgent ticket
    let mut unit_rank: HashMap<&str, (Reverse<u8>, usize)> = HashMap::new();
    for (i, t) in pending.iter().enumerate() {
        let rank = (Reverse(t.priority.weight()), i);
        unit_rank
            .entry(t.unit.as_str())
            .and_modify(|r| *r = (*r).min(rank))
            .or_insert(rank);
    }

    pending.sort_by(|a, b| {
        Reverse(a.priority.weight())
            .cmp(&Reverse(b.priority.weight()))
            .then_with(|| unit_rank[a.unit.as_str()].cmp(&unit_rank[b.unit.as_str()]))
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    pending
}
