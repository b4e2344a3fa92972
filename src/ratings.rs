//! Per-officer rating aggregation.

use chrono::{DateTime, Utc};

use crate::duration::review_delay;
use crate::models::{Criterion, Review, Ticket};

/// Mean score per criterion for one officer, kept at full precision.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficerAggregate {
    pub officer: String,
    pub review_count: usize,
    averages: [f64; 5],
}

impl OfficerAggregate {
    pub fn average(&self, criterion: Criterion) -> f64 {
        self.averages[index(criterion)]
    }

    /// One-decimal value for display.
    pub fn rounded(&self, criterion: Criterion) -> f64 {
        round_one_decimal(self.average(criterion))
    }
}

/// A reviewed ticket as shown in the review detail list.
#[derive(Debug, Clone, Copy)]
pub struct ReviewedTicket<'a> {
    pub ticket: &'a Ticket,
    pub officer: &'a str,
    pub review: &'a Review,
}

impl ReviewedTicket<'_> {
    pub fn reviewed_at(&self) -> DateTime<Utc> {
        self.review.reviewed_at
    }

    /// How long the reporter took to review after completion.
    pub fn review_delay(&self) -> Option<String> {
        self.ticket
            .completed_at
            .map(|completed| review_delay(completed, self.review.reviewed_at))
    }
}

/// Tickets carrying both an assigned officer and a review, in collection order.
pub fn reviewed(tickets: &[Ticket]) -> impl Iterator<Item = ReviewedTicket<'_>> {
    tickets.iter().filter_map(|ticket| {
        let officer = ticket.assigned_officer.as_deref()?;
        let review = ticket.review.as_ref()?;
        Some(ReviewedTicket {
            ticket,
            officer,
            review,
        })
    })
}

/// Averages for every officer with at least one review, in order of first
/// appearance in `tickets`.
pub fn aggregate(tickets: &[Ticket]) -> Vec<OfficerAggregate> {
    let mut sums: Vec<(&str, usize, [u32; 5])> = Vec::new();

    for entry in reviewed(tickets) {
        let slot = match sums.iter().position(|(officer, _, _)| *officer == entry.officer) {
            Some(i) => i,
            None => {
                sums.push((entry.officer, 0, [0; 5]));
                sums.len() - 1
            }
        };
        let (_, count, totals) = &mut sums[slot];
        *count += 1;
        for criterion in Criterion::ALL {
            totals[index(criterion)] += u32::from(entry.review.score(criterion).stars);
        }
    }

    sums.into_iter()
        .map(|(officer, count, totals)| OfficerAggregate {
            officer: officer.to_string(),
            review_count: count,
            averages: totals.map(|total| f64::from(total) / count as f64),
        })
        .collect()
}

/// Reviewed tickets, most recent review first. Ties keep collection order.
pub fn review_details(tickets: &[Ticket]) -> Vec<ReviewedTicket<'_>> {
    let mut details: Vec<_> = reviewed(tickets).collect();
    details.sort_by(|a, b| b.reviewed_at().cmp(&a.reviewed_at()));
    details
}

/// Aggregate and detail list restricted to a single officer.
pub fn officer_view<'a>(
    tickets: &'a [Ticket],
    officer: &str,
) -> (Option<OfficerAggregate>, Vec<ReviewedTicket<'a>>) {
    let summary = aggregate(tickets).into_iter().find(|a| a.officer == officer);
    let details = review_details(tickets)
        .into_iter()
        .filter(|d| d.officer == officer)
        .collect();
    (summary, details)
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

const fn index(criterion: Criterion) -> usize {
    match criterion {
        Criterion::Attitude => 0,
        Criterion::Neatness => 1,
        Criterion::Quality => 2,
        Criterion::Speed => 3,
        Criterion::Communication => 4,
    }
}
