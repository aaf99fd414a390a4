//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server.
//! Field names are camelCase and timestamps are RFC 3339 strings. Required request
//! fields default to empty so that a missing one is reported by the forum's own
//! validation, after the caller has been checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stackit_core::domain::{
    Answer, AnswerView, Notification, NotificationFeed, Question, QuestionView, User,
};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Requests Sent FROM the Client
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestionRequest {
    #[serde(default)]
    pub title: String,
    /// Rich text markup.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct PostAnswerRequest {
    /// Rich text markup.
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VoteRequest {
    /// Either `up` or `down`.
    #[serde(rename = "type", default)]
    pub direction: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptAnswerRequest {
    #[serde(default)]
    pub question_id: Option<Uuid>,
}

//=========================================================================================
// Responses Sent FROM the Server
//=========================================================================================

/// The caller's own profile.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            name: user.name,
            email: user.email,
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

/// What anyone may see about a user.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserResponse {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            name: user.name,
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub author_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_answer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Question> for QuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id.into(),
            title: question.title,
            description: question.description,
            tags: question.tags.into_iter().collect(),
            author_id: question.author_id.into(),
            author_name: None,
            accepted_answer_id: question.accepted_answer_id.map(Into::into),
            created_at: question.created_at,
            updated_at: question.updated_at,
        }
    }
}

impl From<QuestionView> for QuestionResponse {
    fn from(view: QuestionView) -> Self {
        Self {
            author_name: Some(view.author_name),
            ..view.question.into()
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub id: Uuid,
    pub question_id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub upvotes: Vec<Uuid>,
    pub downvotes: Vec<Uuid>,
    /// Upvotes minus downvotes.
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Answer> for AnswerResponse {
    fn from(answer: Answer) -> Self {
        Self {
            id: answer.id.into(),
            question_id: answer.question_id.into(),
            content: answer.content,
            author_id: answer.author_id.into(),
            author_name: None,
            upvotes: answer.votes.upvotes().iter().map(|id| id.as_uuid()).collect(),
            downvotes: answer.votes.downvotes().iter().map(|id| id.as_uuid()).collect(),
            score: answer.votes.score(),
            created_at: answer.created_at,
            updated_at: answer.updated_at,
        }
    }
}

impl From<AnswerView> for AnswerResponse {
    fn from(view: AnswerView) -> Self {
        Self {
            author_name: Some(view.author_name),
            ..view.answer.into()
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    /// One of `answer`, `comment`, `mention`.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub link: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id.into(),
            user_id: notification.user_id.into(),
            kind: notification.kind.as_str().to_string(),
            message: notification.message,
            link: notification.link,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeedResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: usize,
}

impl From<NotificationFeed> for NotificationFeedResponse {
    fn from(feed: NotificationFeed) -> Self {
        Self {
            notifications: feed.notifications.into_iter().map(Into::into).collect(),
            unread_count: feed.unread_count,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
