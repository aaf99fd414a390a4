//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout. Together with the
//! `identify_caller` middleware they form the service's identity provider.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use stackit_core::{validation, ForumError, Identity, PortError, User};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::protocol::UserResponse;
use crate::web::state::AppState;

const SESSION_COOKIE: &str = "session";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Display name shown next to questions and answers.
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    /// The session token, also set as the `session` cookie. Send it as
    /// `Authorization: Bearer <token>` when cookies are not an option.
    pub token: String,
}

//=========================================================================================
// Session Helpers
//=========================================================================================

/// Extracts the session token from the `session` cookie or a bearer `Authorization` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .filter(|token| !token.is_empty())
        });
    if let Some(token) = from_cookie {
        return Some(token.to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn session_cookie(state: &AppState, token: &str, max_age_seconds: i64) -> String {
    let secure = if state.config.cookie_secure { " Secure;" } else { "" };
    format!(
        "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, secure, max_age_seconds
    )
}

/// Opens a new auth session for `user` and builds the response that hands it out.
async fn start_session(
    state: &AppState,
    user: User,
    status: StatusCode,
) -> Result<impl IntoResponse, ApiError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);

    state
        .store
        .create_auth_session(&auth_session_id, &user.external_auth_id, Utc::now() + ttl)
        .await?;

    let cookie = session_cookie(state, &auth_session_id, ttl.num_seconds());
    let response = AuthResponse {
        user_id: user.id.into(),
        email: user.email,
        name: user.name,
        token: auth_session_id,
    };
    Ok((status, [(header::SET_COOKIE, cookie)], Json(response)))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new account and its forum profile
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // 1. Validate everything before anything is written
    let email = validation::email(&req.email)?;
    let name = validation::required_text("name", &req.name)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ForumError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }

    // 2. Create the credentials, then the profile they resolve to
    let password_hash = hash_password(&req.password)?;
    let identity = state.store.create_identity(&email, &password_hash).await?;
    let user = match state.forum.register_user(&identity.subject, &name, &email).await {
        Ok(user) => user,
        Err(e) => {
            // Credentials without a profile would lock the email out; drop them.
            if let Err(cleanup) = state.store.delete_identity(&identity.subject).await {
                error!(
                    "Failed to remove credentials {} after a failed signup: {}",
                    identity.subject, cleanup
                );
            }
            return Err(e.into());
        }
    };
    info!("New account {} for user {}", identity.subject, user.id);

    // 3. Log the new user in
    start_session(&state, user, StatusCode::CREATED).await
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();

    // 1. Get credentials by email; unknown emails look exactly like bad passwords
    let credentials = match state.store.get_identity_by_email(&email).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => {
            warn!("Login attempt for unknown email");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    // 2. Verify password
    if !verify_password(&req.password, &credentials.hashed_password)? {
        warn!("Failed login for subject {}", credentials.subject);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    // 3. Open a session for the profile behind these credentials
    let user = state.forum.profile_for_subject(&credentials.subject).await?;
    start_session(&state, user, StatusCode::OK).await
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let auth_session_id = session_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("No session found".to_string()))?;

    state.store.delete_auth_session(&auth_session_id).await?;

    let cookie = session_cookie(&state, "", 0);
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// GET /auth/me - The profile of the current caller
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current profile", body = UserResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.forum.current_user(&identity).await?;
    Ok(Json(user.into()))
}
