//! crates/stackit_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the forum's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete store behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Answer, AnswerId, IdentityCredentials, NewAnswer, NewNotification, NewQuestion, NewUser,
    Notification, NotificationId, Question, QuestionId, User, UserId,
};
use crate::votes::VoteLedger;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    Duplicate(String),
    /// A compare-and-swap write lost against a concurrent writer.
    #[error("Stale revision: {0}")]
    RevisionConflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The authoritative store for every forum record.
///
/// Implementations must make each write atomic at the granularity of one record.
/// `save_answer_votes` is a compare-and-swap: it only succeeds if the stored
/// answer still carries `expected_revision`, and it bumps the revision and
/// `updated_at` on success.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForumStore: Send + Sync {
    // --- Identity Provider ---
    async fn create_identity(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<IdentityCredentials>;

    async fn get_identity_by_email(&self, email: &str) -> PortResult<IdentityCredentials>;

    /// Removes credentials and every session opened with them.
    async fn delete_identity(&self, subject: &str) -> PortResult<()>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        subject: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the subject owning a live session, or `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<String>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Users ---
    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    async fn get_user(&self, user_id: UserId) -> PortResult<User>;

    async fn get_user_by_external_id(&self, external_auth_id: &str) -> PortResult<User>;

    // --- Questions ---
    async fn create_question(&self, question: NewQuestion) -> PortResult<Question>;

    async fn get_question(&self, question_id: QuestionId) -> PortResult<Question>;

    /// All questions, newest first.
    async fn list_questions(&self) -> PortResult<Vec<Question>>;

    /// Atomically overwrites the accepted-answer slot and refreshes `updated_at`.
    async fn set_accepted_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> PortResult<Question>;

    // --- Answers ---
    async fn create_answer(&self, answer: NewAnswer) -> PortResult<Answer>;

    async fn get_answer(&self, answer_id: AnswerId) -> PortResult<Answer>;

    /// Answers to one question, oldest first.
    async fn list_answers(&self, question_id: QuestionId) -> PortResult<Vec<Answer>>;

    async fn save_answer_votes(
        &self,
        answer_id: AnswerId,
        votes: &VoteLedger,
        expected_revision: i64,
    ) -> PortResult<Answer>;

    // --- Notifications ---
    async fn create_notification(&self, notification: NewNotification)
        -> PortResult<Notification>;

    async fn get_notification(&self, notification_id: NotificationId)
        -> PortResult<Notification>;

    /// Notifications for one recipient, newest first.
    async fn list_notifications(&self, user_id: UserId) -> PortResult<Vec<Notification>>;

    async fn mark_notification_read(
        &self,
        notification_id: NotificationId,
    ) -> PortResult<Notification>;
}
