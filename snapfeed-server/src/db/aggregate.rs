//! Read-side composition of stored rows into the views the API returns.
//!
//! These are built from several primitive reads and are not a snapshot: a
//! concurrent write can land between them.

use snapfeed_types::{CommentWithUser, PostId, PostWithDetails, PublicUser, UserId, UserWithStats};

use super::{Storage, StoreResult};

/// A post with its author, live like count and comment thread.
///
/// Returns `None` if the post or its author is missing.
pub fn get_post_with_details(
    store: &dyn Storage,
    post_id: PostId,
) -> StoreResult<Option<PostWithDetails>> {
    let Some(post) = store.get_post(post_id)? else {
        return Ok(None);
    };
    let Some(owner) = store.get_user(post.user_id)? else {
        tracing::warn!("Post {} references missing user {}", post.id, post.user_id);
        return Ok(None);
    };

    let likes = store.count_likes_by_post(post.id)?;
    let comments = get_comments_with_users(store, post.id)?;

    Ok(Some(PostWithDetails {
        post,
        user: PublicUser::from(owner),
        likes,
        comments,
        is_liked: None,
    }))
}

/// Comments on a post, oldest first, each with its author.
///
/// A comment whose author no longer resolves is skipped with a warning.
pub fn get_comments_with_users(
    store: &dyn Storage,
    post_id: PostId,
) -> StoreResult<Vec<CommentWithUser>> {
    let mut comments = Vec::new();
    for comment in store.get_comments_by_post(post_id)? {
        match store.get_user(comment.user_id)? {
            Some(author) => comments.push(CommentWithUser {
                comment,
                user: PublicUser::from(author),
            }),
            None => tracing::warn!(
                "Skipping comment {} on post {}: author {} not found",
                comment.id,
                post_id,
                comment.user_id
            ),
        }
    }
    Ok(comments)
}

/// A user with post, follower and following counts, and optionally their posts
pub fn get_user_with_stats(
    store: &dyn Storage,
    user_id: UserId,
    include_posts: bool,
) -> StoreResult<Option<UserWithStats>> {
    let Some(user) = store.get_user(user_id)? else {
        return Ok(None);
    };

    let posts = if include_posts {
        Some(store.get_posts_by_user(user_id)?)
    } else {
        None
    };

    Ok(Some(UserWithStats {
        user: PublicUser::from(user),
        post_count: store.count_posts_by_user(user_id)?,
        follower_count: store.count_followers(user_id)?,
        following_count: store.count_following(user_id)?,
        is_following: None,
        posts,
    }))
}

/// Annotate a post with whether `viewer_id` has liked it
pub fn with_viewer_like(
    store: &dyn Storage,
    mut details: PostWithDetails,
    viewer_id: UserId,
) -> StoreResult<PostWithDetails> {
    details.is_liked = Some(store.get_like(viewer_id, details.post.id)?.is_some());
    Ok(details)
}

/// Annotate a user with whether `viewer_id` follows them
pub fn with_viewer_follow(
    store: &dyn Storage,
    mut stats: UserWithStats,
    viewer_id: UserId,
) -> StoreResult<UserWithStats> {
    stats.is_following = Some(store.get_follow(viewer_id, stats.user.id)?.is_some());
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemStorage;
    use snapfeed_types::{NewComment, NewFollow, NewLike, NewPost, NewUser, User};

    fn add_user(store: &MemStorage, username: &str) -> User {
        store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: "hash".to_string(),
                full_name: username.to_uppercase(),
                email: format!("{}@example.com", username),
                bio: None,
                profile_image: None,
            })
            .unwrap()
    }

    fn add_post(store: &MemStorage, user_id: UserId) -> PostId {
        store
            .create_post(NewPost {
                user_id,
                image_url: "https://example.com/p.jpg".to_string(),
                caption: Some("hi".to_string()),
                location: None,
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_post_details_counts_and_comment_order() {
        let store = MemStorage::new();
        let alice = add_user(&store, "alice");
        let bob = add_user(&store, "bob");
        let post_id = add_post(&store, alice.id);

        store
            .like_post(NewLike {
                user_id: alice.id,
                post_id,
            })
            .unwrap();
        store
            .like_post(NewLike {
                user_id: bob.id,
                post_id,
            })
            .unwrap();
        for (user_id, content) in [(bob.id, "first"), (alice.id, "second")] {
            store
                .create_comment(NewComment {
                    user_id,
                    post_id,
                    content: content.to_string(),
                })
                .unwrap();
        }

        let details = get_post_with_details(&store, post_id).unwrap().unwrap();
        assert_eq!(details.user.username, "alice");
        assert_eq!(details.likes, 2);
        assert_eq!(details.is_liked, None);

        let contents: Vec<&str> = details
            .comments
            .iter()
            .map(|c| c.comment.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(details.comments[0].user.username, "bob");
    }

    #[test]
    fn test_post_details_missing_post() {
        let store = MemStorage::new();
        assert!(get_post_with_details(&store, 42).unwrap().is_none());
    }

    #[test]
    fn test_post_details_missing_owner() {
        let store = MemStorage::new();
        // Store doesn't enforce foreign keys, so an orphan post is possible
        let post_id = add_post(&store, 99);
        assert!(get_post_with_details(&store, post_id).unwrap().is_none());
    }

    #[test]
    fn test_comment_with_missing_author_is_skipped() {
        let store = MemStorage::new();
        let alice = add_user(&store, "alice");
        let post_id = add_post(&store, alice.id);
        store
            .create_comment(NewComment {
                user_id: 77,
                post_id,
                content: "ghost".to_string(),
            })
            .unwrap();

        let details = get_post_with_details(&store, post_id).unwrap().unwrap();
        assert!(details.comments.is_empty());
    }

    #[test]
    fn test_user_stats() {
        let store = MemStorage::new();
        let alice = add_user(&store, "alice");
        let bob = add_user(&store, "bob");
        let carol = add_user(&store, "carol");
        add_post(&store, alice.id);
        add_post(&store, alice.id);

        store
            .follow_user(NewFollow {
                follower_id: bob.id,
                following_id: alice.id,
            })
            .unwrap();
        store
            .follow_user(NewFollow {
                follower_id: carol.id,
                following_id: alice.id,
            })
            .unwrap();
        store
            .follow_user(NewFollow {
                follower_id: alice.id,
                following_id: bob.id,
            })
            .unwrap();

        let stats = get_user_with_stats(&store, alice.id, false).unwrap().unwrap();
        assert_eq!(stats.post_count, 2);
        assert_eq!(stats.follower_count, 2);
        assert_eq!(stats.following_count, 1);
        assert!(stats.posts.is_none());
        assert!(stats.is_following.is_none());

        let with_posts = get_user_with_stats(&store, alice.id, true).unwrap().unwrap();
        assert_eq!(with_posts.posts.map(|p| p.len()), Some(2));

        assert!(get_user_with_stats(&store, 404, false).unwrap().is_none());
    }

    #[test]
    fn test_viewer_annotations_are_relative() {
        let store = MemStorage::new();
        let alice = add_user(&store, "alice");
        let bob = add_user(&store, "bob");
        let post_id = add_post(&store, alice.id);
        store
            .like_post(NewLike {
                user_id: bob.id,
                post_id,
            })
            .unwrap();
        store
            .follow_user(NewFollow {
                follower_id: bob.id,
                following_id: alice.id,
            })
            .unwrap();

        let details = get_post_with_details(&store, post_id).unwrap().unwrap();
        let for_bob = with_viewer_like(&store, details.clone(), bob.id).unwrap();
        let for_alice = with_viewer_like(&store, details, alice.id).unwrap();
        assert_eq!(for_bob.is_liked, Some(true));
        assert_eq!(for_alice.is_liked, Some(false));

        let stats = get_user_with_stats(&store, alice.id, false).unwrap().unwrap();
        assert_eq!(
            with_viewer_follow(&store, stats.clone(), bob.id).unwrap().is_following,
            Some(true)
        );
        assert_eq!(
            with_viewer_follow(&store, stats, alice.id).unwrap().is_following,
            Some(false)
        );
    }
}
