//! services/api/src/web/rest.rs
//!
//! Assembles the REST API router and holds the master definition for the
//! OpenAPI specification.

use crate::web::{
    answers, auth, middleware::identify_caller, notifications, protocol, questions,
    state::AppState, users,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        users::get_user_handler,
        questions::list_questions_handler,
        questions::ask_question_handler,
        questions::get_question_handler,
        questions::list_answers_handler,
        questions::post_answer_handler,
        answers::vote_handler,
        answers::accept_handler,
        notifications::list_notifications_handler,
        notifications::mark_read_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            protocol::AskQuestionRequest,
            protocol::PostAnswerRequest,
            protocol::VoteRequest,
            protocol::AcceptAnswerRequest,
            protocol::UserResponse,
            protocol::PublicUserResponse,
            protocol::QuestionResponse,
            protocol::AnswerResponse,
            protocol::NotificationResponse,
            protocol::NotificationFeedResponse,
            protocol::ErrorResponse,
        )
    ),
    tags(
        (name = "StackIt API", description = "Questions, answers, votes and notifications for the StackIt forum.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "The service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

//=========================================================================================
// Router
//=========================================================================================

/// Builds the API routes. Every forum route runs behind `identify_caller`; the
/// liveness check and the login flow do not.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no identity resolved)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Forum routes (anonymous reads allowed, writes need a caller)
    let forum_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/users/{id}", get(users::get_user_handler))
        .route(
            "/questions",
            get(questions::list_questions_handler).post(questions::ask_question_handler),
        )
        .route("/questions/{id}", get(questions::get_question_handler))
        .route(
            "/questions/{id}/answers",
            get(questions::list_answers_handler).post(questions::post_answer_handler),
        )
        .route("/answers/{id}/vote", post(answers::vote_handler))
        .route("/answers/{id}/accept", post(answers::accept_handler))
        .route(
            "/notifications",
            get(notifications::list_notifications_handler),
        )
        .route(
            "/notifications/{id}/read",
            put(notifications::mark_read_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            identify_caller,
        ));

    Router::new()
        .merge(public_routes)
        .merge(forum_routes)
        .with_state(state)
}
