//! services/api/src/web/middleware.rs
//!
//! Identity middleware for the forum routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use stackit_core::{Identity, PortError};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::web::auth::session_token;
use crate::web::state::AppState;

/// Middleware that works out who is calling and inserts the resulting `Identity`
/// into the request extensions.
///
/// A request without credentials proceeds as `Identity::Anonymous`; read-only
/// routes accept that and mutating operations reject it. A request that presents
/// a session token which is unknown or expired is refused with 401 right here.
pub async fn identify_caller(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the session token, if any
    let Some(auth_session_id) = session_token(req.headers()) else {
        req.extensions_mut().insert(Identity::Anonymous);
        return Ok(next.run(req).await);
    };

    // 2. Validate the auth session, get the identity-provider subject
    let subject = match state.store.validate_auth_session(&auth_session_id).await {
        Ok(subject) => subject,
        Err(PortError::Unauthorized) | Err(PortError::NotFound(_)) => {
            debug!("Rejected unknown or expired auth session");
            return Err(ApiError::Unauthorized(
                "Session is invalid or has expired".to_string(),
            ));
        }
        Err(e) => {
            warn!("Failed to validate auth session: {:?}", e);
            return Err(e.into());
        }
    };

    // 3. Resolve the subject to the forum profile acting on this request
    let caller = state.forum.resolve_caller(&subject).await?;
    req.extensions_mut().insert(Identity::Authenticated(caller));

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
