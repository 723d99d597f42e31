use axum::{extract::State, http::HeaderMap, Json};

use snapfeed_types::PostWithDetails;

use super::{require_viewer, ApiResult};
use crate::db::feed::get_feed_for_user;
use crate::state::AppState;

/// GET /api/feed - Your posts and those of everyone you follow, newest first
pub async fn get_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PostWithDetails>>> {
    let viewer_id = require_viewer(&state, &headers)?;
    let feed = get_feed_for_user(state.store.as_ref(), viewer_id)?;
    Ok(Json(feed))
}
