use std::collections::BTreeSet;

use snapfeed_types::{PostWithDetails, UserId};

use super::aggregate::{get_post_with_details, with_viewer_like};
use super::store::sort_newest_first;
use super::{Storage, StoreResult};

/// Reverse-chronological feed for `viewer_id`: their own posts plus posts
/// from everyone they follow, each annotated with the viewer's like state.
pub fn get_feed_for_user(
    store: &dyn Storage,
    viewer_id: UserId,
) -> StoreResult<Vec<PostWithDetails>> {
    let mut authors: BTreeSet<UserId> = store
        .get_following_by_user(viewer_id)?
        .into_iter()
        .map(|follow| follow.following_id)
        .collect();
    authors.insert(viewer_id);

    let mut posts = Vec::new();
    for author_id in &authors {
        posts.extend(store.get_posts_by_user(*author_id)?);
    }
    sort_newest_first(&mut posts);

    let mut feed = Vec::with_capacity(posts.len());
    for post in posts {
        if let Some(details) = get_post_with_details(store, post.id)? {
            feed.push(with_viewer_like(store, details, viewer_id)?);
        }
    }

    tracing::debug!(
        "Composed feed of {} posts from {} authors for user {}",
        feed.len(),
        authors.len(),
        viewer_id
    );
    Ok(feed)
}
