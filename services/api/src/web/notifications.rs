//! services/api/src/web/notifications.rs
//!
//! Handlers for the caller's notification feed.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use stackit_core::{Identity, NotificationId};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::protocol::{NotificationFeedResponse, NotificationResponse};
use crate::web::state::AppState;

/// The caller's notifications, newest first, with the number still unread.
#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "The caller's notifications", body = NotificationFeedResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_notifications_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<NotificationFeedResponse>, ApiError> {
    let feed = state.forum.notifications(&identity).await?;
    Ok(Json(feed.into()))
}

#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "The notification, now read", body = NotificationResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Notification belongs to someone else"),
        (status = 404, description = "No such notification")
    )
)]
pub async fn mark_read_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let notification = state
        .forum
        .mark_notification_read(&identity, NotificationId::from(id))
        .await?;
    Ok(Json(notification.into()))
}
