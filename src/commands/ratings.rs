use anyhow::{bail, Result};

use ticketdesk::desk::Desk;
use ticketdesk::models::{Criterion, Role};
use ticketdesk::ratings::{self, OfficerAggregate, ReviewedTicket};
use ticketdesk::store::TicketStore;

pub fn run<S: TicketStore>(desk: &Desk<S>) -> Result<()> {
    let tickets = desk.tickets();
    let user = desk.user();

    let (summaries, details) = match user.role {
        Role::Admin => (ratings::aggregate(&tickets), ratings::review_details(&tickets)),
        Role::Officer => {
            let (summary, details) = ratings::officer_view(&tickets, &user.username);
            (summary.into_iter().collect(), details)
        }
        Role::User => bail!("Ratings are only visible to officers and admins"),
    };

    if summaries.is_empty() {
        println!("No reviews yet.");
        return Ok(());
    }

    for summary in &summaries {
        for line in summary_lines(summary) {
            println!("{}", line);
        }
        println!();
    }

    println!("Reviews:");
    for detail in &details {
        println!("{}", detail_line(detail));
    }
    Ok(())
}

fn summary_lines(summary: &OfficerAggregate) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({} review{})",
        summary.officer,
        summary.review_count,
        if summary.review_count == 1 { "" } else { "s" }
    )];
    for criterion in Criterion::ALL {
        lines.push(format!("  {:<28} {:.1}", criterion.label(), summary.rounded(criterion)));
    }
    lines
}

fn detail_line(detail: &ReviewedTicket<'_>) -> String {
    let stars: Vec<String> = Criterion::ALL
        .iter()
        .map(|c| detail.review.score(*c).stars.to_string())
        .collect();
    let mut line = format!(
        "  #{:<4} {:<30} {:<12} {}  [{}]",
        detail.ticket.id,
        super::list::truncate(&detail.ticket.title, 30),
        detail.officer,
        detail.reviewed_at().format("%Y-%m-%d"),
        stars.join(" ")
    );
    if let Some(delay) = detail.review_delay() {
        line.push_str(&format!("  reviewed after {}", delay));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{desk_as, file_ticket, setup_db};
    use ticketdesk::db::Database;
    use ticketdesk::lifecycle::Action;
    use ticketdesk::models::Ratings;

    fn reviewed_by(db: &Database, officer: &str, stars: u8) {
        let ticket = file_ticket(db, "Keuangan", "AC bocor");
        let officer_desk = desk_as(db, officer, Role::Officer);
        officer_desk.apply(&ticket.id, Action::Start).unwrap();
        officer_desk.apply(&ticket.id, Action::Complete).unwrap();
        let user = desk_as(db, "Keuangan", Role::User);
        user.apply(&ticket.id, Action::SubmitReview(Ratings::uniform(stars)))
            .unwrap();
    }

    #[test]
    fn test_summary_lines_round_to_one_decimal() {
        let (db, _dir) = setup_db();
        reviewed_by(&db, "budi", 4);
        reviewed_by(&db, "budi", 5);
        reviewed_by(&db, "budi", 5);

        let admin = desk_as(&db, "admin", Role::Admin);
        let summaries = ratings::aggregate(&admin.tickets());
        let lines = summary_lines(&summaries[0]);
        assert_eq!(lines[0], "budi (3 reviews)");
        assert!(lines[1].ends_with("4.7"));
    }

    #[test]
    fn test_detail_line_shows_scores() {
        let (db, _dir) = setup_db();
        reviewed_by(&db, "budi", 3);

        let tickets = desk_as(&db, "admin", Role::Admin).tickets();
        let details = ratings::review_details(&tickets);
        let line = detail_line(&details[0]);
        assert!(line.contains("[3 3 3 3 3]"));
        assert!(line.contains("budi"));
    }

    #[test]
    fn test_run_per_role() {
        let (db, _dir) = setup_db();
        reviewed_by(&db, "budi", 4);
        reviewed_by(&db, "andi", 2);

        assert!(run(&desk_as(&db, "admin", Role::Admin)).is_ok());
        assert!(run(&desk_as(&db, "budi", Role::Officer)).is_ok());
        assert!(run(&desk_as(&db, "Keuangan", Role::User)).is_err());
    }

    #[test]
    fn test_run_without_reviews() {
        let (db, _dir) = setup_db();
        assert!(run(&desk_as(&db, "admin", Role::Admin)).is_ok());
    }
}
