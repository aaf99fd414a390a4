//! crates/stackit_core/src/domain.rs
//!
//! Defines the pure, core data structures for the forum.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ForumError;
use crate::votes::VoteLedger;

//=========================================================================================
// Identifiers
//=========================================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Stable internal identifier of a forum user.
    UserId
);
entity_id!(
    /// Identifier of a question.
    QuestionId
);
entity_id!(
    /// Identifier of an answer.
    AnswerId
);
entity_id!(NotificationId);

//=========================================================================================
// Users and Identity
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Guest,
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Role::Guest),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(ForumError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

/// A registered forum user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    /// Subject issued by the identity provider for this user.
    pub external_auth_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// The data needed to register a new user profile.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub external_auth_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct IdentityCredentials {
    pub subject: String,
    pub email: String,
    pub hashed_password: String,
}

/// A caller whose credentials were verified upstream and resolved to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }
}

/// Who is making a request, resolved once at the authentication boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated(Caller),
}

impl Identity {
    /// Returns the authenticated caller, or `AuthenticationRequired` for anonymous requests.
    pub fn require(&self) -> Result<&Caller, ForumError> {
        match self {
            Identity::Authenticated(caller) => Ok(caller),
            Identity::Anonymous => Err(ForumError::AuthenticationRequired),
        }
    }
}

//=========================================================================================
// Questions and Answers
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    /// Rich text markup, opaque to the core.
    pub description: String,
    pub tags: BTreeSet<String>,
    pub author_id: UserId,
    pub accepted_answer_id: Option<AnswerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    pub fn acceptance(&self) -> AcceptanceState {
        match self.accepted_answer_id {
            Some(answer_id) => AcceptanceState::Accepted(answer_id),
            None => AcceptanceState::Unaccepted,
        }
    }
}

/// The single accepted-answer slot of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptanceState {
    Unaccepted,
    Accepted(AnswerId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub author_id: UserId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    /// Rich text markup, opaque to the core.
    pub content: String,
    pub author_id: UserId,
    pub votes: VoteLedger,
    /// Bumped by the store on every write; used for compare-and-swap updates.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub question_id: QuestionId,
    pub content: String,
    pub author_id: UserId,
}

/// A question paired with the display name of its author.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub question: Question,
    pub author_name: String,
}

/// An answer paired with the display name of its author.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerView {
    pub answer: Answer,
    pub author_name: String,
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Answer,
    Comment,
    Mention,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Answer => "answer",
            NotificationKind::Comment => "comment",
            NotificationKind::Mention => "mention",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "answer" => Ok(NotificationKind::Answer),
            "comment" => Ok(NotificationKind::Comment),
            "mention" => Ok(NotificationKind::Mention),
            other => Err(ForumError::Validation(format!(
                "unknown notification type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub link: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub link: String,
}

/// A user's notifications, newest first, with the number still unread.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("guest", Role::Guest)]
    #[case("user", Role::User)]
    #[case("admin", Role::Admin)]
    fn role_parses_its_own_name(#[case] raw: &str, #[case] expected: Role) {
        let role: Role = raw.parse().unwrap();
        assert_eq!(role, expected);
        assert_eq!(role.as_str(), raw);
    }

    #[test]
    fn unknown_role_is_a_validation_error() {
        assert!(matches!(
            "root".parse::<Role>(),
            Err(ForumError::Validation(_))
        ));
    }

    #[test]
    fn anonymous_identity_requires_authentication() {
        assert!(matches!(
            Identity::Anonymous.require(),
            Err(ForumError::AuthenticationRequired)
        ));

        let caller = Caller {
            user_id: UserId::new(),
            role: Role::User,
        };
        assert_eq!(Identity::Authenticated(caller).require().unwrap(), &caller);
    }

    #[test]
    fn question_acceptance_reflects_the_slot() {
        let now = Utc::now();
        let mut question = Question {
            id: QuestionId::new(),
            title: "t".to_string(),
            description: "d".to_string(),
            tags: BTreeSet::new(),
            author_id: UserId::new(),
            accepted_answer_id: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(question.acceptance(), AcceptanceState::Unaccepted);

        let answer_id = AnswerId::new();
        question.accepted_answer_id = Some(answer_id);
        assert_eq!(question.acceptance(), AcceptanceState::Accepted(answer_id));
    }
}
