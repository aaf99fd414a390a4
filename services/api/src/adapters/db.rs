//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ForumStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stackit_core::domain::{
    Answer, AnswerId, IdentityCredentials, NewAnswer, NewNotification, NewQuestion, NewUser,
    Notification, NotificationId, Question, QuestionId, User, UserId,
};
use stackit_core::ports::{ForumStore, PortError, PortResult};
use stackit_core::votes::VoteLedger;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ForumStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Closes every pooled connection. Called once on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

const USER_COLUMNS: &str = "id, external_auth_id, name, email, role, created_at";
const QUESTION_COLUMNS: &str =
    "id, title, description, tags, author_id, accepted_answer_id, created_at, updated_at";
const ANSWER_COLUMNS: &str =
    "id, question_id, content, author_id, upvotes, downvotes, revision, created_at, updated_at";
const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, message, link, read, created_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a failed lookup, turning a missing row into `NotFound`.
fn lookup_error(kind: &str, id: impl std::fmt::Display) -> impl FnOnce(sqlx::Error) -> PortError {
    let what = format!("{} {} not found", kind, id);
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => unexpected(e),
    }
}

const QUESTION_AUTHOR_FK: &str = "questions_author_id_fkey";
const ANSWER_QUESTION_FK: &str = "answers_question_id_fkey";
const ANSWER_AUTHOR_FK: &str = "answers_author_id_fkey";
const NOTIFICATION_USER_FK: &str = "notifications_user_id_fkey";

/// Maps a failed insert, turning a violation of one of the listed foreign keys
/// into `NotFound` with that key's message.
fn reference_error(
    references: Vec<(&'static str, String)>,
) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| {
        let violated = match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                db.constraint().map(str::to_string)
            }
            _ => None,
        };
        match references
            .into_iter()
            .find(|(constraint, _)| violated.as_deref() == Some(*constraint))
        {
            Some((_, what)) => PortError::NotFound(what),
            None => unexpected(e),
        }
    }
}

/// Maps a failed insert, turning a unique-constraint violation into `Duplicate`.
fn insert_error(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return PortError::Duplicate(what);
            }
        }
        unexpected(e)
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct IdentityRecord {
    subject: String,
    email: String,
    hashed_password: String,
}
impl IdentityRecord {
    fn to_domain(self) -> IdentityCredentials {
        IdentityCredentials {
            subject: self.subject,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    external_auth_id: String,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id.into(),
            external_auth_id: self.external_auth_id,
            name: self.name,
            email: self.email,
            role: self
                .role
                .parse()
                .map_err(|e: stackit_core::ForumError| PortError::Unexpected(e.to_string()))?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    id: Uuid,
    title: String,
    description: String,
    tags: Vec<String>,
    author_id: Uuid,
    accepted_answer_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl QuestionRecord {
    fn to_domain(self) -> Question {
        Question {
            id: self.id.into(),
            title: self.title,
            description: self.description,
            tags: self.tags.into_iter().collect(),
            author_id: self.author_id.into(),
            accepted_answer_id: self.accepted_answer_id.map(AnswerId::from),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AnswerRecord {
    id: Uuid,
    question_id: Uuid,
    content: String,
    author_id: Uuid,
    upvotes: Vec<Uuid>,
    downvotes: Vec<Uuid>,
    revision: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl AnswerRecord {
    fn to_domain(self) -> PortResult<Answer> {
        let votes = VoteLedger::from_parts(
            self.upvotes.into_iter().map(UserId::from),
            self.downvotes.into_iter().map(UserId::from),
        )
        .map_err(|e| PortError::Unexpected(format!("answer {}: {}", self.id, e)))?;
        Ok(Answer {
            id: self.id.into(),
            question_id: self.question_id.into(),
            content: self.content,
            author_id: self.author_id.into(),
            votes,
            revision: self.revision,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct NotificationRecord {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    message: String,
    link: String,
    read: bool,
    created_at: DateTime<Utc>,
}
impl NotificationRecord {
    fn to_domain(self) -> PortResult<Notification> {
        Ok(Notification {
            id: self.id.into(),
            user_id: self.user_id.into(),
            kind: self
                .kind
                .parse()
                .map_err(|e: stackit_core::ForumError| PortError::Unexpected(e.to_string()))?,
            message: self.message,
            link: self.link,
            read: self.read,
            created_at: self.created_at,
        })
    }
}

fn uuids<'a>(ids: impl IntoIterator<Item = &'a UserId>) -> Vec<Uuid> {
    ids.into_iter().map(UserId::as_uuid).collect()
}

//=========================================================================================
// `ForumStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ForumStore for DbAdapter {
    // --- Identity Provider ---
    async fn create_identity(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<IdentityCredentials> {
        let record = sqlx::query_as::<_, IdentityRecord>(
            "INSERT INTO identities (subject, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING subject, email, hashed_password",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error(format!("email {} is already registered", email)))?;
        Ok(record.to_domain())
    }

    async fn get_identity_by_email(&self, email: &str) -> PortResult<IdentityCredentials> {
        let record = sqlx::query_as::<_, IdentityRecord>(
            "SELECT subject, email, hashed_password FROM identities WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error("Identity", email))?;
        Ok(record.to_domain())
    }

    async fn delete_identity(&self, subject: &str) -> PortResult<()> {
        // Sessions go with it (ON DELETE CASCADE).
        sqlx::query("DELETE FROM identities WHERE subject = $1")
            .bind(subject)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        subject: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        // Opening a session is also when expired ones are swept.
        sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        sqlx::query("INSERT INTO auth_sessions (id, subject, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(subject)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT subject FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Users ---
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, external_auth_id, name, email, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.external_auth_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error(format!("a profile for {} already exists", user.email)))?;
        record.to_domain()
    }

    async fn get_user(&self, user_id: UserId) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error("User", user_id))?
        .to_domain()
    }

    async fn get_user_by_external_id(&self, external_auth_id: &str) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_auth_id = $1"
        ))
        .bind(external_auth_id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error("User with subject", external_auth_id))?
        .to_domain()
    }

    // --- Questions ---
    async fn create_question(&self, question: NewQuestion) -> PortResult<Question> {
        let author_id = question.author_id;
        let tags: Vec<String> = question.tags.into_iter().collect();
        let record = sqlx::query_as::<_, QuestionRecord>(&format!(
            "INSERT INTO questions (id, title, description, tags, author_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(question.title)
        .bind(question.description)
        .bind(tags)
        .bind(author_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(reference_error(vec![(
            QUESTION_AUTHOR_FK,
            format!("User {} not found", author_id),
        )]))?;
        Ok(record.to_domain())
    }

    async fn get_question(&self, question_id: QuestionId) -> PortResult<Question> {
        let record = sqlx::query_as::<_, QuestionRecord>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(question_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error("Question", question_id))?;
        Ok(record.to_domain())
    }

    async fn list_questions(&self) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn set_accepted_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> PortResult<Question> {
        let record = sqlx::query_as::<_, QuestionRecord>(&format!(
            "UPDATE questions SET accepted_answer_id = $2, updated_at = now() \
             WHERE id = $1 RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(question_id.as_uuid())
        .bind(answer_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error("Question", question_id))?;
        Ok(record.to_domain())
    }

    // --- Answers ---
    async fn create_answer(&self, answer: NewAnswer) -> PortResult<Answer> {
        let question_id = answer.question_id;
        let author_id = answer.author_id;
        sqlx::query_as::<_, AnswerRecord>(&format!(
            "INSERT INTO answers (id, question_id, content, author_id) \
             VALUES ($1, $2, $3, $4) RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(question_id.as_uuid())
        .bind(answer.content)
        .bind(author_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(reference_error(vec![
            (ANSWER_QUESTION_FK, format!("Question {} not found", question_id)),
            (ANSWER_AUTHOR_FK, format!("User {} not found", author_id)),
        ]))?
        .to_domain()
    }

    async fn get_answer(&self, answer_id: AnswerId) -> PortResult<Answer> {
        sqlx::query_as::<_, AnswerRecord>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE id = $1"
        ))
        .bind(answer_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error("Answer", answer_id))?
        .to_domain()
    }

    async fn list_answers(&self, question_id: QuestionId) -> PortResult<Vec<Answer>> {
        let records = sqlx::query_as::<_, AnswerRecord>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE question_id = $1 ORDER BY created_at ASC"
        ))
        .bind(question_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_answer_votes(
        &self,
        answer_id: AnswerId,
        votes: &VoteLedger,
        expected_revision: i64,
    ) -> PortResult<Answer> {
        // Compare-and-swap: the row only changes if nobody wrote it since our read.
        let updated = sqlx::query_as::<_, AnswerRecord>(&format!(
            "UPDATE answers \
             SET upvotes = $2, downvotes = $3, revision = revision + 1, updated_at = now() \
             WHERE id = $1 AND revision = $4 RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(answer_id.as_uuid())
        .bind(uuids(votes.upvotes()))
        .bind(uuids(votes.downvotes()))
        .bind(expected_revision)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = updated {
            return record.to_domain();
        }

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM answers WHERE id = $1)")
            .bind(answer_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        if exists {
            Err(PortError::RevisionConflict(format!(
                "answer {} moved past revision {}",
                answer_id, expected_revision
            )))
        } else {
            Err(PortError::NotFound(format!("Answer {} not found", answer_id)))
        }
    }

    // --- Notifications ---
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> PortResult<Notification> {
        let user_id = notification.user_id;
        sqlx::query_as::<_, NotificationRecord>(&format!(
            "INSERT INTO notifications (id, user_id, kind, message, link) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id.as_uuid())
        .bind(notification.kind.as_str())
        .bind(notification.message)
        .bind(notification.link)
        .fetch_one(&self.pool)
        .await
        .map_err(reference_error(vec![(
            NOTIFICATION_USER_FK,
            format!("User {} not found", user_id),
        )]))?
        .to_domain()
    }

    async fn get_notification(
        &self,
        notification_id: NotificationId,
    ) -> PortResult<Notification> {
        sqlx::query_as::<_, NotificationRecord>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(notification_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error("Notification", notification_id))?
        .to_domain()
    }

    async fn list_notifications(&self, user_id: UserId) -> PortResult<Vec<Notification>> {
        let records = sqlx::query_as::<_, NotificationRecord>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn mark_notification_read(
        &self,
        notification_id: NotificationId,
    ) -> PortResult<Notification> {
        sqlx::query_as::<_, NotificationRecord>(&format!(
            "UPDATE notifications SET read = true WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(notification_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error("Notification", notification_id))?
        .to_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;

    #[derive(Debug, thiserror::Error)]
    #[error("constraint {constraint} violated")]
    struct ConstraintViolation {
        constraint: &'static str,
        unique: bool,
    }

    impl DatabaseError for ConstraintViolation {
        fn message(&self) -> &str {
            "constraint violated"
        }
        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }
        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }
        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }
        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }
        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::ForeignKeyViolation
            }
        }
    }

    fn foreign_key_violation(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintViolation {
            constraint,
            unique: false,
        }))
    }

    fn answer_references() -> Vec<(&'static str, String)> {
        vec![
            (ANSWER_QUESTION_FK, "Question q not found".to_string()),
            (ANSWER_AUTHOR_FK, "User u not found".to_string()),
        ]
    }

    #[test]
    fn missing_rows_are_named_by_the_violated_key() {
        let question = reference_error(answer_references())(foreign_key_violation(ANSWER_QUESTION_FK));
        let author = reference_error(answer_references())(foreign_key_violation(ANSWER_AUTHOR_FK));

        assert!(matches!(question, PortError::NotFound(what) if what == "Question q not found"));
        assert!(matches!(author, PortError::NotFound(what) if what == "User u not found"));
    }

    #[test]
    fn unlisted_violations_stay_unexpected() {
        let other = reference_error(answer_references())(foreign_key_violation("some_other_fkey"));
        let missing_row = reference_error(answer_references())(sqlx::Error::RowNotFound);

        assert!(matches!(other, PortError::Unexpected(_)));
        assert!(matches!(missing_row, PortError::Unexpected(_)));
    }

    #[test]
    fn unique_violations_are_duplicates() {
        let err = sqlx::Error::Database(Box::new(ConstraintViolation {
            constraint: "identities_email_key",
            unique: true,
        }));
        assert!(matches!(
            insert_error("email taken".to_string())(err),
            PortError::Duplicate(_)
        ));
    }
}
