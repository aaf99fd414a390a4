//! crates/stackit_core/src/service.rs
//!
//! The application service: every forum operation, expressed against the
//! `ForumStore` port. The service keeps no state between calls; each mutation
//! re-reads the authoritative record, applies its transition and writes it back.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::acceptance::authorize_acceptance;
use crate::domain::{
    Answer, AnswerId, AnswerView, Caller, Identity, NewAnswer, NewNotification, NewQuestion,
    NewUser, Notification, NotificationFeed, NotificationId, NotificationKind, Question,
    QuestionId, QuestionView, Role, User, UserId,
};
use crate::error::{ForumError, ForumResult};
use crate::ports::{ForumStore, PortError};
use crate::validation;
use crate::votes::VoteDirection;

const UNKNOWN_AUTHOR: &str = "Unknown";

/// Tunables for `ForumService`.
#[derive(Debug, Clone, Copy)]
pub struct ForumSettings {
    /// How many times a vote is re-read and re-applied after losing a
    /// compare-and-swap race before giving up with `WriteContention`.
    pub max_vote_attempts: u32,
}

impl Default for ForumSettings {
    fn default() -> Self {
        Self {
            max_vote_attempts: 3,
        }
    }
}

#[derive(Clone)]
pub struct ForumService {
    store: Arc<dyn ForumStore>,
    settings: ForumSettings,
}

impl ForumService {
    pub fn new(store: Arc<dyn ForumStore>, settings: ForumSettings) -> Self {
        Self { store, settings }
    }

    //=====================================================================================
    // Users and Identity
    //=====================================================================================

    /// Registers the profile for an identity-provider subject.
    ///
    /// Registration is idempotent: a subject that already has a profile gets it back
    /// unchanged. New profiles always start with the `user` role.
    pub async fn register_user(&self, subject: &str, name: &str, email: &str) -> ForumResult<User> {
        let subject = validation::required_text("subject", subject)?;
        match self.store.get_user_by_external_id(&subject).await {
            Ok(existing) => return Ok(existing),
            Err(PortError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let user = self
            .store
            .create_user(NewUser {
                external_auth_id: subject,
                name: validation::required_text("name", name)?,
                email: validation::email(email)?,
                role: Role::User,
            })
            .await?;
        info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// The profile registered for a verified identity-provider subject.
    /// A subject without a profile cannot act on the forum.
    pub async fn profile_for_subject(&self, subject: &str) -> ForumResult<User> {
        match self.store.get_user_by_external_id(subject).await {
            Ok(user) => Ok(user),
            Err(PortError::NotFound(_)) => Err(ForumError::AuthenticationRequired),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves a verified identity-provider subject to the caller acting on the forum.
    pub async fn resolve_caller(&self, subject: &str) -> ForumResult<Caller> {
        let user = self.profile_for_subject(subject).await?;
        Ok(Caller::from(&user))
    }

    pub async fn current_user(&self, identity: &Identity) -> ForumResult<User> {
        let caller = identity.require()?;
        Ok(self.store.get_user(caller.user_id).await?)
    }

    pub async fn get_user(&self, user_id: UserId) -> ForumResult<User> {
        Ok(self.store.get_user(user_id).await?)
    }

    //=====================================================================================
    // Questions
    //=====================================================================================

    pub async fn ask_question(
        &self,
        identity: &Identity,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> ForumResult<Question> {
        let caller = identity.require()?;
        let question = self
            .store
            .create_question(NewQuestion {
                title: validation::title(title)?,
                description: validation::required_text("description", description)?,
                tags: validation::tags(tags)?,
                author_id: caller.user_id,
            })
            .await?;
        info!("User {} asked question {}", caller.user_id, question.id);
        Ok(question)
    }

    pub async fn list_questions(&self) -> ForumResult<Vec<QuestionView>> {
        let questions = self.store.list_questions().await?;
        let author_ids = questions.iter().map(|q| q.author_id).collect();
        let names = self.author_names(author_ids).await?;
        Ok(questions
            .into_iter()
            .map(|question| QuestionView {
                author_name: name_for(&names, question.author_id),
                question,
            })
            .collect())
    }

    pub async fn get_question(&self, question_id: QuestionId) -> ForumResult<QuestionView> {
        let question = self.store.get_question(question_id).await?;
        let names = self.author_names(vec![question.author_id]).await?;
        Ok(QuestionView {
            author_name: name_for(&names, question.author_id),
            question,
        })
    }

    //=====================================================================================
    // Answers
    //=====================================================================================

    /// Posts an answer and notifies the question's author, unless they answered themselves.
    pub async fn post_answer(
        &self,
        identity: &Identity,
        question_id: QuestionId,
        content: &str,
    ) -> ForumResult<Answer> {
        let caller = identity.require()?;
        let content = validation::required_text("content", content)?;
        let question = self.store.get_question(question_id).await?;

        let answer = self
            .store
            .create_answer(NewAnswer {
                question_id,
                content,
                author_id: caller.user_id,
            })
            .await?;
        info!("User {} answered question {}", caller.user_id, question_id);

        if question.author_id != caller.user_id {
            let notification = NewNotification {
                user_id: question.author_id,
                kind: NotificationKind::Answer,
                message: format!("New answer on \"{}\"", question.title),
                link: format!("/questions/{}", question.id),
            };
            // The answer is already stored; notification failures are only logged.
            if let Err(e) = self.store.create_notification(notification).await {
                warn!(
                    "Failed to notify user {} about answer {}: {}",
                    question.author_id, answer.id, e
                );
            }
        }

        Ok(answer)
    }

    pub async fn list_answers(&self, question_id: QuestionId) -> ForumResult<Vec<AnswerView>> {
        // Distinguish "no answers yet" from "no such question".
        self.store.get_question(question_id).await?;
        let answers = self.store.list_answers(question_id).await?;
        let author_ids = answers.iter().map(|a| a.author_id).collect();
        let names = self.author_names(author_ids).await?;
        Ok(answers
            .into_iter()
            .map(|answer| AnswerView {
                author_name: name_for(&names, answer.author_id),
                answer,
            })
            .collect())
    }

    //=====================================================================================
    // Vote Ledger
    //=====================================================================================

    /// Toggles the caller's vote on an answer.
    ///
    /// The write is a compare-and-swap on the answer's revision. If another vote
    /// lands between our read and our write, the answer is read again and the
    /// toggle re-applied to the fresh sets, up to `max_vote_attempts` times.
    pub async fn apply_vote(
        &self,
        identity: &Identity,
        answer_id: AnswerId,
        direction: VoteDirection,
    ) -> ForumResult<Answer> {
        let voter = identity.require()?.user_id;
        let attempts = self.settings.max_vote_attempts.max(1);

        for attempt in 1..=attempts {
            let mut answer = self.store.get_answer(answer_id).await?;
            let outcome = answer.votes.apply(voter, direction);

            match self
                .store
                .save_answer_votes(answer_id, &answer.votes, answer.revision)
                .await
            {
                Ok(saved) => {
                    info!(
                        "Vote {:?} ({}) by {} on answer {}",
                        outcome,
                        direction.as_str(),
                        voter,
                        answer_id
                    );
                    return Ok(saved);
                }
                Err(PortError::RevisionConflict(_)) => {
                    warn!(
                        "Vote on answer {} lost a concurrent write (attempt {}/{})",
                        answer_id, attempt, attempts
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ForumError::WriteContention(format!(
            "answer {answer_id} kept changing while voting"
        )))
    }

    //=====================================================================================
    // Acceptance Gate
    //=====================================================================================

    /// Marks `answer_id` as the accepted answer of `question_id`, replacing any
    /// previous acceptance. Only the question's author may do this.
    pub async fn accept_answer(
        &self,
        identity: &Identity,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> ForumResult<Question> {
        let caller = identity.require()?;
        let question = self.store.get_question(question_id).await?;
        let answer = self.store.get_answer(answer_id).await?;
        authorize_acceptance(&question, &answer, caller)?;

        let question = self.store.set_accepted_answer(question_id, answer_id).await?;
        info!(
            "User {} accepted answer {} on question {}",
            caller.user_id, answer_id, question_id
        );
        Ok(question)
    }

    //=====================================================================================
    // Notifications
    //=====================================================================================

    pub async fn notifications(&self, identity: &Identity) -> ForumResult<NotificationFeed> {
        let caller = identity.require()?;
        let notifications = self.store.list_notifications(caller.user_id).await?;
        let unread_count = notifications.iter().filter(|n| !n.read).count();
        Ok(NotificationFeed {
            notifications,
            unread_count,
        })
    }

    pub async fn mark_notification_read(
        &self,
        identity: &Identity,
        notification_id: NotificationId,
    ) -> ForumResult<Notification> {
        let caller = identity.require()?;
        let notification = self.store.get_notification(notification_id).await?;
        if notification.user_id != caller.user_id {
            return Err(ForumError::AuthorizationDenied(
                "notifications can only be updated by their recipient".to_string(),
            ));
        }
        if notification.read {
            return Ok(notification);
        }
        Ok(self.store.mark_notification_read(notification_id).await?)
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    async fn author_names(&self, author_ids: Vec<UserId>) -> ForumResult<HashMap<UserId, String>> {
        let mut names = HashMap::new();
        for author_id in author_ids {
            if names.contains_key(&author_id) {
                continue;
            }
            match self.store.get_user(author_id).await {
                Ok(user) => {
                    names.insert(author_id, user.name);
                }
                Err(PortError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(names)
    }
}

fn name_for(names: &HashMap<UserId, String>, author_id: UserId) -> String {
    names
        .get(&author_id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockForumStore;
    use crate::votes::VoteLedger;
    use chrono::Utc;
    use mockall::predicate::eq;
    use std::collections::BTreeSet;

    fn caller(user_id: UserId) -> Identity {
        Identity::Authenticated(Caller {
            user_id,
            role: Role::User,
        })
    }

    fn service(store: MockForumStore) -> ForumService {
        ForumService::new(Arc::new(store), ForumSettings::default())
    }

    fn user(id: UserId, name: &str) -> User {
        User {
            id,
            external_auth_id: format!("subject-{id}"),
            name: name.to_string(),
            email: format!("{name}@example.com"),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    fn question(id: QuestionId, author_id: UserId) -> Question {
        let now = Utc::now();
        Question {
            id,
            title: "Why does the borrow checker complain?".to_string(),
            description: "<p>details</p>".to_string(),
            tags: BTreeSet::from(["rust".to_string()]),
            author_id,
            accepted_answer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn answer(id: AnswerId, question_id: QuestionId, author_id: UserId, revision: i64) -> Answer {
        let now = Utc::now();
        Answer {
            id,
            question_id,
            content: "<p>use a reference</p>".to_string(),
            author_id,
            votes: VoteLedger::new(),
            revision,
            created_at: now,
            updated_at: now,
        }
    }

    fn notification(id: NotificationId, user_id: UserId, read: bool) -> Notification {
        Notification {
            id,
            user_id,
            kind: NotificationKind::Answer,
            message: "New answer".to_string(),
            link: "/questions/x".to_string(),
            read,
            created_at: Utc::now(),
        }
    }

    //--- votes ---

    #[tokio::test]
    async fn anonymous_votes_never_touch_the_store() {
        // No expectations: any store call panics.
        let forum = service(MockForumStore::new());

        let err = forum
            .apply_vote(&Identity::Anonymous, AnswerId::new(), VoteDirection::Up)
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn vote_writes_the_toggled_ledger_against_the_read_revision() {
        let voter = UserId::new();
        let answer_id = AnswerId::new();
        let stored = answer(answer_id, QuestionId::new(), UserId::new(), 7);

        let mut store = MockForumStore::new();
        let read = stored.clone();
        store
            .expect_get_answer()
            .with(eq(answer_id))
            .times(1)
            .returning(move |_| Ok(read.clone()));
        store
            .expect_save_answer_votes()
            .withf(move |id, votes, revision| {
                *id == answer_id && *revision == 7 && votes.vote_of(voter) == Some(VoteDirection::Up)
            })
            .times(1)
            .returning(move |_, votes, _| {
                let mut saved = stored.clone();
                saved.votes = votes.clone();
                saved.revision = 8;
                Ok(saved)
            });

        let saved = service(store)
            .apply_vote(&caller(voter), answer_id, VoteDirection::Up)
            .await
            .unwrap();

        assert!(saved.votes.upvotes().contains(&voter));
        assert_eq!(saved.revision, 8);
    }

    #[tokio::test]
    async fn lost_race_is_retried_on_a_fresh_read() {
        let voter = UserId::new();
        let rival = UserId::new();
        let answer_id = AnswerId::new();
        let question_id = QuestionId::new();

        let stale = answer(answer_id, question_id, UserId::new(), 1);
        let mut fresh = stale.clone();
        fresh.votes.apply(rival, VoteDirection::Down);
        fresh.revision = 2;

        let mut store = MockForumStore::new();
        // Popped from the back: the stale read comes first.
        let mut reads = vec![fresh.clone(), stale];
        store
            .expect_get_answer()
            .times(2)
            .returning(move |_| Ok(reads.pop().expect("two reads")));
        store
            .expect_save_answer_votes()
            .withf(|_, _, revision| *revision == 1)
            .times(1)
            .returning(|_, _, _| Err(PortError::RevisionConflict("stale".to_string())));
        store
            .expect_save_answer_votes()
            .withf(|_, _, revision| *revision == 2)
            .times(1)
            .returning(move |_, votes, _| {
                let mut saved = fresh.clone();
                saved.votes = votes.clone();
                saved.revision = 3;
                Ok(saved)
            });

        let saved = service(store)
            .apply_vote(&caller(voter), answer_id, VoteDirection::Up)
            .await
            .unwrap();

        assert_eq!(saved.votes.vote_of(voter), Some(VoteDirection::Up));
        assert_eq!(saved.votes.vote_of(rival), Some(VoteDirection::Down));
    }

    #[tokio::test]
    async fn persistent_contention_gives_up() {
        let answer_id = AnswerId::new();
        let stored = answer(answer_id, QuestionId::new(), UserId::new(), 1);

        let mut store = MockForumStore::new();
        store
            .expect_get_answer()
            .times(2)
            .returning(move |_| Ok(stored.clone()));
        store
            .expect_save_answer_votes()
            .times(2)
            .returning(|_, _, _| Err(PortError::RevisionConflict("stale".to_string())));

        let forum = ForumService::new(
            Arc::new(store),
            ForumSettings {
                max_vote_attempts: 2,
            },
        );
        let err = forum
            .apply_vote(&caller(UserId::new()), answer_id, VoteDirection::Down)
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::WriteContention(_)));
    }

    #[tokio::test]
    async fn vote_on_missing_answer_is_not_found() {
        let mut store = MockForumStore::new();
        store
            .expect_get_answer()
            .returning(|id| Err(PortError::NotFound(format!("Answer {id} not found"))));
        store.expect_save_answer_votes().never();

        let err = service(store)
            .apply_vote(&caller(UserId::new()), AnswerId::new(), VoteDirection::Up)
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::NotFound(_)));
    }

    //--- acceptance ---

    #[tokio::test]
    async fn owner_accepts_answer() {
        let owner = UserId::new();
        let question_id = QuestionId::new();
        let answer_id = AnswerId::new();
        let q = question(question_id, owner);
        let a = answer(answer_id, question_id, UserId::new(), 0);

        let mut store = MockForumStore::new();
        let read = q.clone();
        store
            .expect_get_question()
            .with(eq(question_id))
            .returning(move |_| Ok(read.clone()));
        store.expect_get_answer().returning(move |_| Ok(a.clone()));
        store
            .expect_set_accepted_answer()
            .with(eq(question_id), eq(answer_id))
            .times(1)
            .returning(move |_, answer_id| {
                let mut accepted = q.clone();
                accepted.accepted_answer_id = Some(answer_id);
                Ok(accepted)
            });

        let accepted = service(store)
            .accept_answer(&caller(owner), question_id, answer_id)
            .await
            .unwrap();

        assert_eq!(accepted.accepted_answer_id, Some(answer_id));
    }

    #[tokio::test]
    async fn non_owner_acceptance_writes_nothing() {
        let answerer = UserId::new();
        let question_id = QuestionId::new();
        let q = question(question_id, UserId::new());
        let a = answer(AnswerId::new(), question_id, answerer, 0);

        let mut store = MockForumStore::new();
        store.expect_get_question().returning(move |_| Ok(q.clone()));
        store.expect_get_answer().returning(move |_| Ok(a.clone()));
        store.expect_set_accepted_answer().never();

        let err = service(store)
            .accept_answer(&caller(answerer), question_id, AnswerId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::AuthorizationDenied(_)));
    }

    #[tokio::test]
    async fn accepting_a_foreign_answer_conflicts() {
        let owner = UserId::new();
        let question_id = QuestionId::new();
        let q = question(question_id, owner);
        let foreign = answer(AnswerId::new(), QuestionId::new(), UserId::new(), 0);

        let mut store = MockForumStore::new();
        store.expect_get_question().returning(move |_| Ok(q.clone()));
        store
            .expect_get_answer()
            .returning(move |_| Ok(foreign.clone()));
        store.expect_set_accepted_answer().never();

        let err = service(store)
            .accept_answer(&caller(owner), question_id, AnswerId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::Conflict(_)));
    }

    #[tokio::test]
    async fn accepting_on_missing_question_is_not_found() {
        let mut store = MockForumStore::new();
        store
            .expect_get_question()
            .returning(|id| Err(PortError::NotFound(format!("Question {id} not found"))));
        store.expect_get_answer().never();

        let err = service(store)
            .accept_answer(&caller(UserId::new()), QuestionId::new(), AnswerId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::NotFound(_)));
    }

    //--- answers and notifications ---

    #[tokio::test]
    async fn answering_someone_elses_question_notifies_them() {
        let owner = UserId::new();
        let answerer = UserId::new();
        let question_id = QuestionId::new();
        let q = question(question_id, owner);

        let mut store = MockForumStore::new();
        store.expect_get_question().returning(move |_| Ok(q.clone()));
        store
            .expect_create_answer()
            .times(1)
            .returning(move |new| Ok(answer(AnswerId::new(), new.question_id, new.author_id, 0)));
        store
            .expect_create_notification()
            .withf(move |n| {
                n.user_id == owner
                    && n.kind == NotificationKind::Answer
                    && n.link == format!("/questions/{question_id}")
            })
            .times(1)
            .returning(|n| {
                Ok(Notification {
                    id: NotificationId::new(),
                    user_id: n.user_id,
                    kind: n.kind,
                    message: n.message,
                    link: n.link,
                    read: false,
                    created_at: Utc::now(),
                })
            });

        let posted = service(store)
            .post_answer(&caller(answerer), question_id, "  <p>try this</p> ")
            .await
            .unwrap();

        assert_eq!(posted.author_id, answerer);
    }

    #[tokio::test]
    async fn answering_your_own_question_sends_no_notification() {
        let owner = UserId::new();
        let question_id = QuestionId::new();
        let q = question(question_id, owner);

        let mut store = MockForumStore::new();
        store.expect_get_question().returning(move |_| Ok(q.clone()));
        store
            .expect_create_answer()
            .returning(move |new| Ok(answer(AnswerId::new(), new.question_id, new.author_id, 0)));
        store.expect_create_notification().never();

        service(store)
            .post_answer(&caller(owner), question_id, "<p>solved it</p>")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_notification_does_not_fail_the_answer() {
        let question_id = QuestionId::new();
        let q = question(question_id, UserId::new());

        let mut store = MockForumStore::new();
        store.expect_get_question().returning(move |_| Ok(q.clone()));
        store
            .expect_create_answer()
            .returning(move |new| Ok(answer(AnswerId::new(), new.question_id, new.author_id, 0)));
        store
            .expect_create_notification()
            .returning(|_| Err(PortError::Unexpected("connection reset".to_string())));

        let result = service(store)
            .post_answer(&caller(UserId::new()), question_id, "<p>hi</p>")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn empty_answer_is_rejected_before_any_read() {
        let forum = service(MockForumStore::new());

        let err = forum
            .post_answer(&caller(UserId::new()), QuestionId::new(), "   ")
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::Validation(_)));
    }

    #[tokio::test]
    async fn only_the_recipient_marks_a_notification_read() {
        let recipient = UserId::new();
        let notification_id = NotificationId::new();
        let stored = notification(notification_id, recipient, false);

        let mut store = MockForumStore::new();
        store
            .expect_get_notification()
            .returning(move |_| Ok(stored.clone()));
        store.expect_mark_notification_read().never();

        let err = service(store)
            .mark_notification_read(&caller(UserId::new()), notification_id)
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::AuthorizationDenied(_)));
    }

    #[tokio::test]
    async fn feed_counts_unread_notifications() {
        let recipient = UserId::new();
        let feed = vec![
            notification(NotificationId::new(), recipient, false),
            notification(NotificationId::new(), recipient, true),
            notification(NotificationId::new(), recipient, false),
        ];

        let mut store = MockForumStore::new();
        store
            .expect_list_notifications()
            .with(eq(recipient))
            .returning(move |_| Ok(feed.clone()));

        let feed = service(store)
            .notifications(&caller(recipient))
            .await
            .unwrap();

        assert_eq!(feed.notifications.len(), 3);
        assert_eq!(feed.unread_count, 2);
    }

    //--- users ---

    #[tokio::test]
    async fn unknown_subject_cannot_act() {
        let mut store = MockForumStore::new();
        store
            .expect_get_user_by_external_id()
            .returning(|_| Err(PortError::NotFound("no profile".to_string())));

        let err = service(store).resolve_caller("ghost").await.unwrap_err();

        assert!(matches!(err, ForumError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn registration_returns_an_existing_profile() {
        let existing = user(UserId::new(), "ada");
        let expected = existing.clone();

        let mut store = MockForumStore::new();
        store
            .expect_get_user_by_external_id()
            .withf(|subject| subject == "subject-1")
            .returning(move |_| Ok(existing.clone()));
        store.expect_create_user().never();

        let registered = service(store)
            .register_user("subject-1", "Someone Else", "else@example.com")
            .await
            .unwrap();

        assert_eq!(registered, expected);
    }

    #[tokio::test]
    async fn new_profiles_get_the_user_role() {
        let mut store = MockForumStore::new();
        store
            .expect_get_user_by_external_id()
            .returning(|_| Err(PortError::NotFound("no profile".to_string())));
        store
            .expect_create_user()
            .withf(|new| new.role == Role::User && new.email == "ada@example.com")
            .returning(|new| {
                Ok(User {
                    id: UserId::new(),
                    external_auth_id: new.external_auth_id,
                    name: new.name,
                    email: new.email,
                    role: new.role,
                    created_at: Utc::now(),
                })
            });

        let registered = service(store)
            .register_user("subject-2", "Ada", "Ada@Example.com")
            .await
            .unwrap();

        assert_eq!(registered.role, Role::User);
    }

    #[tokio::test]
    async fn listing_falls_back_to_unknown_authors() {
        let known = UserId::new();
        let vanished = UserId::new();
        let questions = vec![
            question(QuestionId::new(), known),
            question(QuestionId::new(), vanished),
            question(QuestionId::new(), known),
        ];

        let mut store = MockForumStore::new();
        store
            .expect_list_questions()
            .returning(move || Ok(questions.clone()));
        store
            .expect_get_user()
            .with(eq(known))
            .times(1)
            .returning(|id| Ok(user(id, "ada")));
        store
            .expect_get_user()
            .with(eq(vanished))
            .times(1)
            .returning(|_| Err(PortError::NotFound("gone".to_string())));

        let views = service(store).list_questions().await.unwrap();
        let names: Vec<&str> = views.iter().map(|v| v.author_name.as_str()).collect();

        assert_eq!(names, vec!["ada", "Unknown", "ada"]);
    }

    // Web handlers run these on a multi-threaded runtime, so their futures must be `Send`.
    #[tokio::test]
    async fn listings_run_on_spawned_tasks() {
        let mut store = MockForumStore::new();
        store.expect_list_questions().returning(|| Ok(Vec::new()));
        store
            .expect_get_question()
            .returning(|id| Ok(question(id, UserId::new())));
        store.expect_list_answers().returning(|_| Ok(Vec::new()));
        let forum = service(store);
        let question_id = QuestionId::new();

        let questions = tokio::spawn({
            let forum = forum.clone();
            async move { forum.list_questions().await }
        });
        let answers = tokio::spawn(async move { forum.list_answers(question_id).await });

        assert!(questions.await.unwrap().unwrap().is_empty());
        assert!(answers.await.unwrap().unwrap().is_empty());
    }
}
