use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use snapfeed_types::{NewFollow, ProfileUpdate, PublicUser, User, UserId, UserWithStats};

use super::validation::{optional, require};
use super::{optional_viewer, require_viewer, ApiError, ApiResult};
use crate::db::aggregate::{get_user_with_stats, with_viewer_follow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
}

fn find_user(state: &AppState, username: &str) -> ApiResult<User> {
    state
        .store
        .get_user_by_username(username)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Stats and posts for `user`, annotated for the viewer when one is known
fn user_stats(
    state: &AppState,
    user: &User,
    viewer_id: Option<UserId>,
) -> ApiResult<UserWithStats> {
    let store = state.store.as_ref();
    let stats = get_user_with_stats(store, user.id, true)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    match viewer_id {
        Some(viewer_id) => Ok(with_viewer_follow(store, stats, viewer_id)?),
        None => Ok(stats),
    }
}

/// GET /api/users/search?q= - Find users by username or full name
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();
    if q.is_empty() {
        return Err(ApiError::BadRequest("Search query is required".to_string()));
    }

    let users = state
        .store
        .get_users_by_search(q)?
        .into_iter()
        .map(PublicUser::from)
        .collect();

    Ok(Json(users))
}

/// GET /api/users/:username - Profile with stats and posts
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<UserWithStats>> {
    let user = find_user(&state, &username)?;
    let viewer_id = optional_viewer(&state, &headers);

    Ok(Json(user_stats(&state, &user, viewer_id)?))
}

/// PUT /api/users/:username/profile - Edit your own profile
pub async fn update_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ProfileUpdate>,
) -> ApiResult<Json<UserWithStats>> {
    let viewer_id = require_viewer(&state, &headers)?;
    let user = find_user(&state, &username)?;

    if user.id != viewer_id {
        return Err(ApiError::Forbidden(
            "You can only edit your own profile".to_string(),
        ));
    }

    let update = ProfileUpdate {
        full_name: payload
            .full_name
            .as_deref()
            .map(|name| require("fullName", name))
            .transpose()?,
        bio: optional(payload.bio),
        profile_image: optional(payload.profile_image),
    };

    let updated = state
        .store
        .update_user_profile(user.id, update)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!("Updated profile for {}", updated.username);
    Ok(Json(user_stats(&state, &updated, None)?))
}

/// POST /api/users/:username/follow - Follow a user
pub async fn follow_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<UserWithStats>> {
    let viewer_id = require_viewer(&state, &headers)?;
    let target = find_user(&state, &username)?;

    if target.id == viewer_id {
        return Err(ApiError::BadRequest("Cannot follow yourself".to_string()));
    }

    state.store.follow_user(NewFollow {
        follower_id: viewer_id,
        following_id: target.id,
    })?;

    Ok(Json(user_stats(&state, &target, Some(viewer_id))?))
}

/// DELETE /api/users/:username/follow - Stop following a user
pub async fn unfollow_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<UserWithStats>> {
    let viewer_id = require_viewer(&state, &headers)?;
    let target = find_user(&state, &username)?;

    state.store.unfollow_user(viewer_id, target.id)?;

    Ok(Json(user_stats(&state, &target, Some(viewer_id))?))
}
