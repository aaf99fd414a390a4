//! services/api/src/adapters/memory.rs
//!
//! A volatile implementation of the `ForumStore` port. Every table lives behind a
//! single `RwLock`, so each write is atomic with respect to every other one.
//! Selected with `STORAGE_BACKEND=memory`; also the store used by the HTTP tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stackit_core::domain::{
    Answer, AnswerId, IdentityCredentials, NewAnswer, NewNotification, NewQuestion, NewUser,
    Notification, NotificationId, Question, QuestionId, User, UserId,
};
use stackit_core::ports::{ForumStore, PortError, PortResult};
use stackit_core::votes::VoteLedger;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    identities: HashMap<String, IdentityCredentials>,
    auth_sessions: HashMap<String, (String, DateTime<Utc>)>,
    users: HashMap<UserId, User>,
    // Kept in insertion order, which is also creation order.
    questions: Vec<Question>,
    answers: Vec<Answer>,
    notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(kind: &str, id: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", kind, id))
}

#[async_trait]
impl ForumStore for InMemoryStore {
    // --- Identity Provider ---
    async fn create_identity(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<IdentityCredentials> {
        let mut tables = self.tables.write().await;
        if tables.identities.contains_key(email) {
            return Err(PortError::Duplicate(format!("email {} is already registered", email)));
        }
        let credentials = IdentityCredentials {
            subject: Uuid::new_v4().to_string(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        tables
            .identities
            .insert(email.to_string(), credentials.clone());
        Ok(credentials)
    }

    async fn get_identity_by_email(&self, email: &str) -> PortResult<IdentityCredentials> {
        let tables = self.tables.read().await;
        tables
            .identities
            .get(email)
            .cloned()
            .ok_or_else(|| not_found("Identity", email))
    }

    async fn delete_identity(&self, subject: &str) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables.identities.retain(|_, c| c.subject != subject);
        tables.auth_sessions.retain(|_, session| session.0 != subject);
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        subject: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        tables.auth_sessions.retain(|_, session| session.1 > now);
        tables
            .auth_sessions
            .insert(session_id.to_string(), (subject.to_string(), expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<String> {
        let tables = self.tables.read().await;
        match tables.auth_sessions.get(session_id) {
            Some((subject, expires_at)) if *expires_at > Utc::now() => Ok(subject.clone()),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.write().await.auth_sessions.remove(session_id);
        Ok(())
    }

    // --- Users ---
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.external_auth_id == user.external_auth_id || u.email == user.email)
        {
            return Err(PortError::Duplicate(format!(
                "a profile for {} already exists",
                user.email
            )));
        }
        let created = User {
            id: UserId::new(),
            external_auth_id: user.external_auth_id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, user_id: UserId) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| not_found("User", user_id))
    }

    async fn get_user_by_external_id(&self, external_auth_id: &str) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.external_auth_id == external_auth_id)
            .cloned()
            .ok_or_else(|| not_found("User with subject", external_auth_id))
    }

    // --- Questions ---
    async fn create_question(&self, question: NewQuestion) -> PortResult<Question> {
        let now = Utc::now();
        let created = Question {
            id: QuestionId::new(),
            title: question.title,
            description: question.description,
            tags: question.tags,
            author_id: question.author_id,
            accepted_answer_id: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.questions.push(created.clone());
        Ok(created)
    }

    async fn get_question(&self, question_id: QuestionId) -> PortResult<Question> {
        let tables = self.tables.read().await;
        tables
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .cloned()
            .ok_or_else(|| not_found("Question", question_id))
    }

    async fn list_questions(&self) -> PortResult<Vec<Question>> {
        let tables = self.tables.read().await;
        Ok(tables.questions.iter().rev().cloned().collect())
    }

    async fn set_accepted_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> PortResult<Question> {
        let mut tables = self.tables.write().await;
        let question = tables
            .questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or_else(|| not_found("Question", question_id))?;
        question.accepted_answer_id = Some(answer_id);
        question.updated_at = Utc::now();
        Ok(question.clone())
    }

    // --- Answers ---
    async fn create_answer(&self, answer: NewAnswer) -> PortResult<Answer> {
        let mut tables = self.tables.write().await;
        if !tables.questions.iter().any(|q| q.id == answer.question_id) {
            return Err(not_found("Question", answer.question_id));
        }
        let now = Utc::now();
        let created = Answer {
            id: AnswerId::new(),
            question_id: answer.question_id,
            content: answer.content,
            author_id: answer.author_id,
            votes: VoteLedger::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        };
        tables.answers.push(created.clone());
        Ok(created)
    }

    async fn get_answer(&self, answer_id: AnswerId) -> PortResult<Answer> {
        let tables = self.tables.read().await;
        tables
            .answers
            .iter()
            .find(|a| a.id == answer_id)
            .cloned()
            .ok_or_else(|| not_found("Answer", answer_id))
    }

    async fn list_answers(&self, question_id: QuestionId) -> PortResult<Vec<Answer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn save_answer_votes(
        &self,
        answer_id: AnswerId,
        votes: &VoteLedger,
        expected_revision: i64,
    ) -> PortResult<Answer> {
        let mut tables = self.tables.write().await;
        let answer = tables
            .answers
            .iter_mut()
            .find(|a| a.id == answer_id)
            .ok_or_else(|| not_found("Answer", answer_id))?;
        if answer.revision != expected_revision {
            return Err(PortError::RevisionConflict(format!(
                "answer {} is at revision {}, expected {}",
                answer_id, answer.revision, expected_revision
            )));
        }
        answer.votes = votes.clone();
        answer.revision += 1;
        answer.updated_at = Utc::now();
        Ok(answer.clone())
    }

    // --- Notifications ---
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> PortResult<Notification> {
        let created = Notification {
            id: NotificationId::new(),
            user_id: notification.user_id,
            kind: notification.kind,
            message: notification.message,
            link: notification.link,
            read: false,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .notifications
            .push(created.clone());
        Ok(created)
    }

    async fn get_notification(
        &self,
        notification_id: NotificationId,
    ) -> PortResult<Notification> {
        let tables = self.tables.read().await;
        tables
            .notifications
            .iter()
            .find(|n| n.id == notification_id)
            .cloned()
            .ok_or_else(|| not_found("Notification", notification_id))
    }

    async fn list_notifications(&self, user_id: UserId) -> PortResult<Vec<Notification>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(
        &self,
        notification_id: NotificationId,
    ) -> PortResult<Notification> {
        let mut tables = self.tables.write().await;
        let notification = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| not_found("Notification", notification_id))?;
        notification.read = true;
        Ok(notification.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use stackit_core::domain::Role;
    use stackit_core::votes::VoteDirection;

    async fn seeded_answer(store: &InMemoryStore) -> Answer {
        let author = store
            .create_user(NewUser {
                external_auth_id: "sub-1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();
        let question = store
            .create_question(NewQuestion {
                title: "t".to_string(),
                description: "d".to_string(),
                tags: Default::default(),
                author_id: author.id,
            })
            .await
            .unwrap();
        store
            .create_answer(NewAnswer {
                question_id: question.id,
                content: "c".to_string(),
                author_id: author.id,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn stale_vote_writes_are_rejected() {
        let store = InMemoryStore::new();
        let answer = seeded_answer(&store).await;
        let mut votes = answer.votes.clone();
        votes.apply(UserId::new(), VoteDirection::Up);

        let saved = store
            .save_answer_votes(answer.id, &votes, answer.revision)
            .await
            .unwrap();
        assert_eq!(saved.revision, answer.revision + 1);

        let err = store
            .save_answer_votes(answer.id, &VoteLedger::new(), answer.revision)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::RevisionConflict(_)));

        let current = store.get_answer(answer.id).await.unwrap();
        assert_eq!(current.votes, votes);
    }

    #[tokio::test]
    async fn expired_sessions_are_unauthorized() {
        let store = InMemoryStore::new();
        store
            .create_auth_session("live", "sub", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store
            .create_auth_session("dead", "sub", Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(store.validate_auth_session("live").await.unwrap(), "sub");
        assert!(matches!(
            store.validate_auth_session("dead").await,
            Err(PortError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn opening_a_session_sweeps_expired_ones() {
        let store = InMemoryStore::new();
        store
            .create_auth_session("dead", "sub", Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        store
            .create_auth_session("live", "sub", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        let tables = store.tables.read().await;
        assert!(!tables.auth_sessions.contains_key("dead"));
        assert!(tables.auth_sessions.contains_key("live"));
    }

    #[tokio::test]
    async fn deleting_an_identity_frees_its_email_and_ends_its_sessions() {
        let store = InMemoryStore::new();
        let credentials = store.create_identity("a@example.com", "hash").await.unwrap();
        store
            .create_auth_session("s1", &credentials.subject, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        store.delete_identity(&credentials.subject).await.unwrap();

        assert!(matches!(
            store.get_identity_by_email("a@example.com").await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store.validate_auth_session("s1").await,
            Err(PortError::Unauthorized)
        ));
        store.create_identity("a@example.com", "hash").await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_emails_are_rejected() {
        let store = InMemoryStore::new();
        store.create_identity("a@example.com", "hash").await.unwrap();

        assert!(matches!(
            store.create_identity("a@example.com", "other").await,
            Err(PortError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn answers_need_an_existing_question() {
        let store = InMemoryStore::new();
        let err = store
            .create_answer(NewAnswer {
                question_id: QuestionId::new(),
                content: "c".to_string(),
                author_id: UserId::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
