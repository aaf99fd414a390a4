//! crates/stackit_core/src/error.rs
//!
//! The error taxonomy returned by every forum operation.

use crate::ports::PortError;

/// Errors raised by `ForumService` operations. All of them are terminal for the
/// operation that produced them; nothing is persisted when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Not allowed: {0}")]
    AuthorizationDenied(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Concurrent writers kept invalidating our read of the record.
    #[error("Too many concurrent updates: {0}")]
    WriteContention(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// A convenience type alias for `Result<T, ForumError>`.
pub type ForumResult<T> = Result<T, ForumError>;

impl From<PortError> for ForumError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => ForumError::NotFound(what),
            PortError::Unauthorized => ForumError::AuthenticationRequired,
            PortError::Duplicate(what) => ForumError::Conflict(what),
            PortError::RevisionConflict(what) => ForumError::WriteContention(what),
            PortError::Unexpected(msg) => ForumError::Storage(msg),
        }
    }
}
