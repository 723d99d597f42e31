use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use snapfeed_types::{
    Comment, CommentId, Follow, Like, NewComment, NewFollow, NewLike, NewPost, NewUser, Post,
    PostId, ProfileUpdate, User, UserId,
};

use super::index::{EdgeIndex, GroupIndex};
use super::store::{sort_newest_first, Storage};
use super::{StoreError, StoreResult};

/// Rows of one entity type keyed by id, plus the next id to hand out.
///
/// The counter only moves forward, so ids are never reused after deletion.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    fn remove(&mut self, id: i64) -> Option<T> {
        self.rows.remove(&id)
    }

    /// Clone the rows for the given ids, skipping any that are gone
    fn collect(&self, ids: impl Iterator<Item = i64>) -> Vec<T> {
        ids.filter_map(|id| self.rows.get(&id).cloned()).collect()
    }
}

#[derive(Debug, Default)]
struct MemState {
    users: Table<User>,
    posts: Table<Post>,
    likes: Table<Like>,
    comments: Table<Comment>,
    follows: Table<Follow>,

    /// lowercase username -> user id
    usernames: HashMap<String, UserId>,
    /// lowercase email -> user id
    emails: HashMap<String, UserId>,
    /// author -> posts
    posts_by_user: GroupIndex,
    /// post -> comments
    comments_by_post: GroupIndex,
    /// user -> post
    like_edges: EdgeIndex,
    /// follower -> following
    follow_edges: EdgeIndex,
}

/// Volatile in-memory storage backend.
///
/// All state sits behind one `RwLock`, so each operation (including the
/// duplicate check before a like/follow insert and the post delete cascade)
/// runs as a single atomic step.
#[derive(Debug, Default)]
pub struct MemStorage {
    state: RwLock<MemState>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemState>> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemState>> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Storage for MemStorage {
    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.write()?;

        let username_key = user.username.to_lowercase();
        let email_key = user.email.to_lowercase();
        if state.usernames.contains_key(&username_key) {
            return Err(StoreError::conflict("username", user.username));
        }
        if state.emails.contains_key(&email_key) {
            return Err(StoreError::conflict("email", user.email));
        }

        let created = state.users.insert_with(|id| User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            full_name: user.full_name,
            email: user.email,
            bio: user.bio,
            profile_image: user.profile_image,
        });
        state.usernames.insert(username_key, created.id);
        state.emails.insert(email_key, created.id);

        tracing::debug!("Stored user {} ({})", created.username, created.id);
        Ok(created)
    }

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .usernames
            .get(&username.to_lowercase())
            .and_then(|id| state.users.get(*id))
            .cloned())
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .emails
            .get(&email.to_lowercase())
            .and_then(|id| state.users.get(*id))
            .cloned())
    }

    fn get_users_by_search(&self, query: &str) -> StoreResult<Vec<User>> {
        let needle = query.to_lowercase();
        let state = self.read()?;
        Ok(state
            .users
            .rows
            .values()
            .filter(|user| {
                user.username.to_lowercase().contains(&needle)
                    || user.full_name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    fn update_user_profile(&self, id: UserId, update: ProfileUpdate) -> StoreResult<Option<User>> {
        let mut state = self.write()?;
        let Some(user) = state.users.rows.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
        }
        if let Some(bio) = update.bio {
            user.bio = Some(bio);
        }
        if let Some(profile_image) = update.profile_image {
            user.profile_image = Some(profile_image);
        }
        Ok(Some(user.clone()))
    }

    fn count_users(&self) -> StoreResult<usize> {
        Ok(self.read()?.users.rows.len())
    }

    fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        let mut state = self.write()?;
        let created = state.posts.insert_with(|id| Post {
            id,
            user_id: post.user_id,
            image_url: post.image_url,
            caption: post.caption,
            location: post.location,
            created_at: Utc::now(),
        });
        state.posts_by_user.insert(created.user_id, created.id);
        Ok(created)
    }

    fn get_post(&self, id: PostId) -> StoreResult<Option<Post>> {
        Ok(self.read()?.posts.get(id).cloned())
    }

    fn get_all_posts(&self) -> StoreResult<Vec<Post>> {
        let mut posts: Vec<Post> = self.read()?.posts.rows.values().cloned().collect();
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    fn get_posts_by_user(&self, user_id: UserId) -> StoreResult<Vec<Post>> {
        let state = self.read()?;
        let mut posts = state.posts.collect(state.posts_by_user.members(user_id));
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    fn count_posts_by_user(&self, user_id: UserId) -> StoreResult<usize> {
        Ok(self.read()?.posts_by_user.count(user_id))
    }

    fn delete_post(&self, id: PostId) -> StoreResult<bool> {
        let mut state = self.write()?;
        let state = &mut *state;

        let Some(post) = state.posts.remove(id) else {
            return Ok(false);
        };
        state.posts_by_user.remove(post.user_id, id);

        let like_ids = state.like_edges.remove_target(id);
        for like_id in &like_ids {
            state.likes.remove(*like_id);
        }
        let comment_ids = state.comments_by_post.remove_owner(id);
        for comment_id in &comment_ids {
            state.comments.remove(*comment_id);
        }

        tracing::debug!(
            "Deleted post {} with {} likes and {} comments",
            id,
            like_ids.len(),
            comment_ids.len()
        );
        Ok(true)
    }

    fn like_post(&self, like: NewLike) -> StoreResult<Like> {
        let mut state = self.write()?;
        if let Some(existing) = state
            .like_edges
            .get(like.user_id, like.post_id)
            .and_then(|id| state.likes.get(id))
        {
            return Ok(existing.clone());
        }

        let created = state.likes.insert_with(|id| Like {
            id,
            user_id: like.user_id,
            post_id: like.post_id,
        });
        state
            .like_edges
            .insert(created.user_id, created.post_id, created.id);
        Ok(created)
    }

    fn unlike_post(&self, user_id: UserId, post_id: PostId) -> StoreResult<bool> {
        let mut state = self.write()?;
        match state.like_edges.remove(user_id, post_id) {
            Some(like_id) => Ok(state.likes.remove(like_id).is_some()),
            None => Ok(false),
        }
    }

    fn get_like(&self, user_id: UserId, post_id: PostId) -> StoreResult<Option<Like>> {
        let state = self.read()?;
        Ok(state
            .like_edges
            .get(user_id, post_id)
            .and_then(|id| state.likes.get(id))
            .cloned())
    }

    fn get_likes_by_post(&self, post_id: PostId) -> StoreResult<Vec<Like>> {
        let state = self.read()?;
        Ok(state.likes.collect(state.like_edges.incoming(post_id)))
    }

    fn count_likes_by_post(&self, post_id: PostId) -> StoreResult<usize> {
        Ok(self.read()?.like_edges.incoming_count(post_id))
    }

    fn create_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut state = self.write()?;
        let created = state.comments.insert_with(|id| Comment {
            id,
            user_id: comment.user_id,
            post_id: comment.post_id,
            content: comment.content,
            created_at: Utc::now(),
        });
        state.comments_by_post.insert(created.post_id, created.id);
        Ok(created)
    }

    fn get_comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        Ok(self.read()?.comments.get(id).cloned())
    }

    fn get_comments_by_post(&self, post_id: PostId) -> StoreResult<Vec<Comment>> {
        let state = self.read()?;
        let mut comments = state.comments.collect(state.comments_by_post.members(post_id));
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    fn delete_comment(&self, id: CommentId) -> StoreResult<bool> {
        let mut state = self.write()?;
        match state.comments.remove(id) {
            Some(comment) => {
                state.comments_by_post.remove(comment.post_id, id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn follow_user(&self, follow: NewFollow) -> StoreResult<Follow> {
        let mut state = self.write()?;
        if let Some(existing) = state
            .follow_edges
            .get(follow.follower_id, follow.following_id)
            .and_then(|id| state.follows.get(id))
        {
            return Ok(existing.clone());
        }

        let created = state.follows.insert_with(|id| Follow {
            id,
            follower_id: follow.follower_id,
            following_id: follow.following_id,
        });
        state
            .follow_edges
            .insert(created.follower_id, created.following_id, created.id);
        Ok(created)
    }

    fn unfollow_user(&self, follower_id: UserId, following_id: UserId) -> StoreResult<bool> {
        let mut state = self.write()?;
        match state.follow_edges.remove(follower_id, following_id) {
            Some(follow_id) => Ok(state.follows.remove(follow_id).is_some()),
            None => Ok(false),
        }
    }

    fn get_follow(&self, follower_id: UserId, following_id: UserId) -> StoreResult<Option<Follow>> {
        let state = self.read()?;
        Ok(state
            .follow_edges
            .get(follower_id, following_id)
            .and_then(|id| state.follows.get(id))
            .cloned())
    }

    fn get_followers_by_user(&self, user_id: UserId) -> StoreResult<Vec<Follow>> {
        let state = self.read()?;
        Ok(state.follows.collect(state.follow_edges.incoming(user_id)))
    }

    fn get_following_by_user(&self, user_id: UserId) -> StoreResult<Vec<Follow>> {
        let state = self.read()?;
        Ok(state.follows.collect(state.follow_edges.outgoing(user_id)))
    }

    fn count_followers(&self, user_id: UserId) -> StoreResult<usize> {
        Ok(self.read()?.follow_edges.incoming_count(user_id))
    }

    fn count_following(&self, user_id: UserId) -> StoreResult<usize> {
        Ok(self.read()?.follow_edges.outgoing_count(user_id))
    }
}
