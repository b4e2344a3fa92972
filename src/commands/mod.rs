pub mod create;
pub mod init;
pub mod list;
pub mod next;
pub mod ratings;
pub mod review;
pub mod show;
pub mod status;
pub mod update;

/// Accept `12` and `#12` alike.
pub fn ticket_id(id: &str) -> &str {
    id.trim().trim_start_matches('#')
}
