//! services/api/src/web/questions.rs
//!
//! Handlers for asking, browsing and answering questions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use stackit_core::{Identity, QuestionId};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::protocol::{AnswerResponse, AskQuestionRequest, PostAnswerRequest, QuestionResponse};
use crate::web::state::AppState;

/// List all questions, newest first.
#[utoipa::path(
    get,
    path = "/questions",
    responses(
        (status = 200, description = "All questions", body = [QuestionResponse])
    )
)]
pub async fn list_questions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let questions = state.forum.list_questions().await?;
    Ok(Json(questions.into_iter().map(Into::into).collect()))
}

/// Ask a new question.
#[utoipa::path(
    post,
    path = "/questions",
    request_body = AskQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = QuestionResponse),
        (status = 400, description = "Missing title or description, or invalid tags"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn ask_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<AskQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question = state
        .forum
        .ask_question(&identity, &req.title, &req.description, &req.tags)
        .await?;
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

#[utoipa::path(
    get,
    path = "/questions/{id}",
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "The question", body = QuestionResponse),
        (status = 404, description = "No such question")
    )
)]
pub async fn get_question_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = state.forum.get_question(QuestionId::from(id)).await?;
    Ok(Json(question.into()))
}

/// List a question's answers, oldest first.
#[utoipa::path(
    get,
    path = "/questions/{id}/answers",
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Answers to the question", body = [AnswerResponse]),
        (status = 404, description = "No such question")
    )
)]
pub async fn list_answers_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AnswerResponse>>, ApiError> {
    let answers = state.forum.list_answers(QuestionId::from(id)).await?;
    Ok(Json(answers.into_iter().map(Into::into).collect()))
}

/// Answer a question. The question's author is notified unless they answered
/// it themselves.
#[utoipa::path(
    post,
    path = "/questions/{id}/answers",
    params(("id" = Uuid, Path, description = "Question id")),
    request_body = PostAnswerRequest,
    responses(
        (status = 201, description = "Answer created", body = AnswerResponse),
        (status = 400, description = "Empty content"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such question")
    )
)]
pub async fn post_answer_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<PostAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = state
        .forum
        .post_answer(&identity, QuestionId::from(id), &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(AnswerResponse::from(answer))))
}
