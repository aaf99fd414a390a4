//! services/api/src/web/users.rs

use axum::{
    extract::{Path, State},
    Json,
};
use stackit_core::UserId;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::protocol::PublicUserResponse;
use crate::web::state::AppState;

/// Public profile of any user. Email addresses are not exposed here.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = PublicUserResponse),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUserResponse>, ApiError> {
    let user = state.forum.get_user(UserId::from(id)).await?;
    Ok(Json(user.into()))
}
