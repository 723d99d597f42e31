use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use snapfeed_types::{
    CommentWithUser, CreateCommentRequest, CreatePostRequest, NewComment, NewLike, NewPost, Post,
    PostWithDetails, PublicUser, UserId,
};

use super::validation::{optional, require};
use super::{optional_viewer, parse_id, require_viewer, ApiError, ApiResult};
use crate::db::aggregate::{get_comments_with_users, get_post_with_details, with_viewer_like};
use crate::state::AppState;

fn post_not_found() -> ApiError {
    ApiError::NotFound("Post not found".to_string())
}

fn find_post(state: &AppState, post_id: i64) -> ApiResult<Post> {
    state.store.get_post(post_id)?.ok_or_else(post_not_found)
}

/// Aggregated post, annotated for the viewer when one is known
fn post_details(
    state: &AppState,
    post_id: i64,
    viewer_id: Option<UserId>,
) -> ApiResult<PostWithDetails> {
    let store = state.store.as_ref();
    let details = get_post_with_details(store, post_id)?.ok_or_else(post_not_found)?;

    match viewer_id {
        Some(viewer_id) => Ok(with_viewer_like(store, details, viewer_id)?),
        None => Ok(details),
    }
}

/// GET /api/posts - All posts, newest first
pub async fn list_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PostWithDetails>>> {
    let viewer_id = optional_viewer(&state, &headers);
    let store = state.store.as_ref();

    let mut posts = Vec::new();
    for post in store.get_all_posts()? {
        let Some(details) = get_post_with_details(store, post.id)? else {
            continue;
        };
        posts.push(match viewer_id {
            Some(viewer_id) => with_viewer_like(store, details, viewer_id)?,
            None => details,
        });
    }

    Ok(Json(posts))
}

/// POST /api/posts - Create a new post
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostWithDetails>)> {
    let viewer_id = require_viewer(&state, &headers)?;
    let image_url = require("imageUrl", &payload.image_url)?;

    let post = state.store.create_post(NewPost {
        user_id: viewer_id,
        image_url,
        caption: optional(payload.caption),
        location: optional(payload.location),
    })?;

    tracing::info!("User {} created post {}", viewer_id, post.id);
    let details = post_details(&state, post.id, Some(viewer_id))?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// GET /api/posts/:id - One post with details
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<PostWithDetails>> {
    let post_id = parse_id(&post_id, "post")?;
    let viewer_id = optional_viewer(&state, &headers);

    Ok(Json(post_details(&state, post_id, viewer_id)?))
}

/// DELETE /api/posts/:id - Delete your own post with its likes and comments
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let post_id = parse_id(&post_id, "post")?;
    let viewer_id = require_viewer(&state, &headers)?;
    let post = find_post(&state, post_id)?;

    if post.user_id != viewer_id {
        return Err(ApiError::Forbidden(
            "You can only delete your own posts".to_string(),
        ));
    }

    if !state.store.delete_post(post_id)? {
        return Err(post_not_found());
    }

    tracing::info!("User {} deleted post {}", viewer_id, post_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/:id/like - Like a post
pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<PostWithDetails>> {
    let post_id = parse_id(&post_id, "post")?;
    let viewer_id = require_viewer(&state, &headers)?;
    find_post(&state, post_id)?;

    state.store.like_post(NewLike {
        user_id: viewer_id,
        post_id,
    })?;

    Ok(Json(post_details(&state, post_id, Some(viewer_id))?))
}

/// DELETE /api/posts/:id/like - Remove your like
pub async fn unlike_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<PostWithDetails>> {
    let post_id = parse_id(&post_id, "post")?;
    let viewer_id = require_viewer(&state, &headers)?;
    find_post(&state, post_id)?;

    state.store.unlike_post(viewer_id, post_id)?;

    Ok(Json(post_details(&state, post_id, Some(viewer_id))?))
}

/// GET /api/posts/:id/comments - Comments with authors, oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Vec<CommentWithUser>>> {
    let post_id = parse_id(&post_id, "post")?;
    find_post(&state, post_id)?;

    Ok(Json(get_comments_with_users(state.store.as_ref(), post_id)?))
}

/// POST /api/posts/:id/comments - Comment on a post
pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentWithUser>)> {
    let post_id = parse_id(&post_id, "post")?;
    let viewer_id = require_viewer(&state, &headers)?;
    let content = require("content", &payload.content)?;
    find_post(&state, post_id)?;

    let author = state
        .store
        .get_user(viewer_id)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))?;

    let comment = state.store.create_comment(NewComment {
        user_id: viewer_id,
        post_id,
        content,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(CommentWithUser {
            comment,
            user: PublicUser::from(author),
        }),
    ))
}

/// DELETE /api/posts/:id/comments/:comment_id - Delete your own comment
pub async fn delete_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let post_id = parse_id(&post_id, "post")?;
    let comment_id = parse_id(&comment_id, "comment")?;
    let viewer_id = require_viewer(&state, &headers)?;

    let comment = state
        .store
        .get_comment(comment_id)?
        .filter(|comment| comment.post_id == post_id)
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    if comment.user_id != viewer_id {
        return Err(ApiError::Forbidden(
            "You can only delete your own comments".to_string(),
        ));
    }

    state.store.delete_comment(comment_id)?;
    Ok(StatusCode::NO_CONTENT)
}
