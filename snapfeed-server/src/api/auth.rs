use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use snapfeed_types::{LoginRequest, LoginResponse, NewUser, PublicUser, RegisterRequest};

use super::validation::{optional, require, validate_email, validate_username};
use super::{require_viewer, session_token, ApiError, ApiResult};
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Run argon2 off the async executor
async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::InternalError(format!("Password task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// POST /api/auth/register - Create an account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let username = require("username", &payload.username)?;
    validate_username(&username)?;
    let email = require("email", &payload.email)?;
    validate_email(&email)?;
    let full_name = require("fullName", &payload.full_name)?;
    if payload.password.trim().is_empty() {
        return Err(ApiError::BadRequest("password is required".to_string()));
    }

    // Checked before hashing so duplicates are rejected cheaply
    if state.store.get_user_by_username(&username)?.is_some() {
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }
    if state.store.get_user_by_email(&email)?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password = payload.password;
    let password_hash = blocking(move || hash_password(&password)).await?;

    // Store still rejects a duplicate that raced past the check above
    let user = state.store.create_user(NewUser {
        username,
        password_hash,
        full_name,
        email,
        bio: optional(payload.bio),
        profile_image: optional(payload.profile_image),
    })?;

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

/// POST /api/auth/login - Exchange credentials for a session token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = state
        .store
        .get_user_by_username(payload.username.trim())?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let stored_hash = user.password_hash.clone();
    let password = payload.password;
    let valid = blocking(move || verify_password(&password, &stored_hash)).await?;
    if !valid {
        tracing::debug!("Rejected login for {}", user.username);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let session_token = state.session_manager.create_session(user.id)?;

    Ok(Json(LoginResponse {
        user: PublicUser::from(user),
        session_token,
    }))
}

/// POST /api/auth/logout - End the session named in the header
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let token = session_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state.session_manager.delete_session(token)?;

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// GET /api/auth/me - The user behind the current session
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<PublicUser>> {
    let viewer_id = require_viewer(&state, &headers)?;

    let user = state
        .store
        .get_user(viewer_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(PublicUser::from(user)))
}
