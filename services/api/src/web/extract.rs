//! services/api/src/web/extract.rs

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json`, except that unreadable bodies are rejected through `ApiError`
/// so clients always get a JSON `{"error"}` response.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
