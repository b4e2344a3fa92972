//! Error taxonomy for desk operations.
//!
//! Validation, permission and transition errors are raised before any store
//! request is issued. Transport errors come back from the store and leave the
//! desk's state as it was.

use thiserror::Error;

use crate::models::{Role, Status};

#[derive(Debug, Error)]
pub enum DeskError {
    /// The store could not be reached or rejected the request.
    #[error("Could not reach the ticket store: {0}. Please try again.")]
    Transport(String),

    /// The action is not allowed from the ticket's current status.
    #[error("Cannot {action} ticket #{id}: current status is {status}")]
    InvalidTransition {
        id: String,
        status: Status,
        action: &'static str,
    },

    /// Required input is missing or out of range.
    #[error("{0}")]
    Validation(String),

    /// A payload from the store could not be decoded.
    #[error("Malformed ticket payload: {0}")]
    Decode(String),

    #[error("{role} accounts may not {action} tickets")]
    PermissionDenied { role: Role, action: &'static str },

    #[error("Ticket #{0} not found")]
    NotFound(String),

    /// Another action on the same ticket is still outstanding.
    #[error("Ticket #{0} is already being updated")]
    Busy(String),
}

impl DeskError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        DeskError::Transport(err.to_string())
    }
}

impl From<rusqlite::Error> for DeskError {
    fn from(err: rusqlite::Error) -> Self {
        DeskError::transport(err)
    }
}

impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        DeskError::transport(err)
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;
