pub mod auth;
pub mod error;
pub mod feed;
pub mod posts;
pub mod users;
pub mod validation;

pub use error::{ApiError, ApiResult};

use axum::{
    http::HeaderMap,
    routing::{delete, get, post, put},
    Router,
};

use snapfeed_types::UserId;

use crate::state::AppState;

/// Header carrying the session token issued at login
pub const SESSION_HEADER: &str = "X-Session-Token";

/// Build the application router with every route under `/api`
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Authentication routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::current_user))
        // User routes
        .route("/users/search", get(users::search_users))
        .route("/users/:username", get(users::get_profile))
        .route("/users/:username/profile", put(users::update_profile))
        .route(
            "/users/:username/follow",
            post(users::follow_user).delete(users::unfollow_user),
        )
        // Post routes
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/:id", get(posts::get_post).delete(posts::delete_post))
        .route("/posts/:id/like", post(posts::like_post).delete(posts::unlike_post))
        .route(
            "/posts/:id/comments",
            get(posts::list_comments).post(posts::create_comment),
        )
        .route("/posts/:id/comments/:comment_id", delete(posts::delete_comment))
        // Feed
        .route("/feed", get(feed::get_feed));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

/// Resolve the viewer from the session header, failing with 401
pub(crate) fn require_viewer(state: &AppState, headers: &HeaderMap) -> ApiResult<UserId> {
    let token = session_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .get_authenticated_user_id_from_token(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))
}

/// Resolve the viewer if a valid session header is present
pub(crate) fn optional_viewer(state: &AppState, headers: &HeaderMap) -> Option<UserId> {
    session_token(headers).and_then(|token| state.get_authenticated_user_id_from_token(token))
}

/// Parse a numeric path id, failing with 400
pub(crate) fn parse_id(raw: &str, what: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} ID", what)))
}
