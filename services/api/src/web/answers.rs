//! services/api/src/web/answers.rs
//!
//! Handlers for voting on and accepting answers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use stackit_core::{AnswerId, ForumError, Identity, QuestionId, VoteDirection};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::protocol::{AcceptAnswerRequest, AnswerResponse, QuestionResponse, VoteRequest};
use crate::web::state::AppState;

/// Cast, switch or retract the caller's vote on an answer.
///
/// Repeating the caller's current vote retracts it; voting the other way moves it.
#[utoipa::path(
    post,
    path = "/answers/{id}/vote",
    params(("id" = Uuid, Path, description = "Answer id")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "The answer with its updated votes", body = AnswerResponse),
        (status = 400, description = "Missing or unknown vote type"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such answer"),
        (status = 409, description = "Too many concurrent votes, retry")
    )
)]
pub async fn vote_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<VoteRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    // Anonymous callers are turned away before their payload is judged.
    identity.require()?;
    let direction: VoteDirection = req.direction.parse()?;
    let answer = state
        .forum
        .apply_vote(&identity, AnswerId::from(id), direction)
        .await?;
    Ok(Json(answer.into()))
}

/// Mark an answer as the accepted one for its question. Only the question's
/// author may do this; accepting another answer later replaces the choice.
#[utoipa::path(
    post,
    path = "/answers/{id}/accept",
    params(("id" = Uuid, Path, description = "Answer id")),
    request_body = AcceptAnswerRequest,
    responses(
        (status = 200, description = "The question with its accepted answer", body = QuestionResponse),
        (status = 400, description = "Missing questionId"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller does not own the question"),
        (status = 404, description = "No such question or answer"),
        (status = 409, description = "Answer belongs to another question")
    )
)]
pub async fn accept_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<AcceptAnswerRequest>,
) -> Result<Json<QuestionResponse>, ApiError> {
    identity.require()?;
    let question_id = req
        .question_id
        .ok_or_else(|| ForumError::Validation("Missing questionId".to_string()))?;
    let question = state
        .forum
        .accept_answer(&identity, QuestionId::from(question_id), AnswerId::from(id))
        .await?;
    Ok(Json(question.into()))
}
