use snapfeed_types::{
    Comment, CommentId, Follow, Like, NewComment, NewFollow, NewLike, NewPost, NewUser, Post,
    PostId, ProfileUpdate, User, UserId,
};

use super::StoreResult;

/// Entity store and relationship index for users, posts, likes, comments and follows.
///
/// Every lookup returns `Ok(None)` (or an empty list) for a missing entity.
/// Callers validate foreign keys before writing: the store assumes a post
/// exists when asked to like or comment on it.
///
/// Implementations must keep these guarantees:
/// - IDs are assigned sequentially per entity type and never reused
/// - usernames and emails are unique, compared case-insensitively
/// - at most one like per (user, post) and one follow per (follower, following)
/// - deleting a post removes its likes and comments in the same operation
pub trait Storage: Send + Sync {
    // ===== Users =====

    /// Create a user, failing with `Conflict` if the username or email is taken
    fn create_user(&self, user: NewUser) -> StoreResult<User>;

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Case-insensitive exact match
    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Case-insensitive exact match
    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Case-insensitive substring match on username or full name, in id order
    fn get_users_by_search(&self, query: &str) -> StoreResult<Vec<User>>;

    /// Apply a profile edit, returning the updated user or `None` if it doesn't exist
    fn update_user_profile(&self, id: UserId, update: ProfileUpdate) -> StoreResult<Option<User>>;

    fn count_users(&self) -> StoreResult<usize>;

    // ===== Posts =====

    /// Store a post, stamping `created_at` with the current time
    fn create_post(&self, post: NewPost) -> StoreResult<Post>;

    fn get_post(&self, id: PostId) -> StoreResult<Option<Post>>;

    /// All posts, newest first
    fn get_all_posts(&self) -> StoreResult<Vec<Post>>;

    /// Posts authored by a user, newest first
    fn get_posts_by_user(&self, user_id: UserId) -> StoreResult<Vec<Post>>;

    fn count_posts_by_user(&self, user_id: UserId) -> StoreResult<usize>;

    /// Delete a post together with its likes and comments.
    /// Returns whether the post existed.
    fn delete_post(&self, id: PostId) -> StoreResult<bool>;

    // ===== Likes =====

    /// Like a post. Liking twice returns the existing like.
    fn like_post(&self, like: NewLike) -> StoreResult<Like>;

    fn unlike_post(&self, user_id: UserId, post_id: PostId) -> StoreResult<bool>;

    fn get_like(&self, user_id: UserId, post_id: PostId) -> StoreResult<Option<Like>>;

    fn get_likes_by_post(&self, post_id: PostId) -> StoreResult<Vec<Like>>;

    fn count_likes_by_post(&self, post_id: PostId) -> StoreResult<usize>;

    // ===== Comments =====

    /// Store a comment, stamping `created_at` with the current time
    fn create_comment(&self, comment: NewComment) -> StoreResult<Comment>;

    fn get_comment(&self, id: CommentId) -> StoreResult<Option<Comment>>;

    /// Comments on a post, oldest first
    fn get_comments_by_post(&self, post_id: PostId) -> StoreResult<Vec<Comment>>;

    fn delete_comment(&self, id: CommentId) -> StoreResult<bool>;

    // ===== Follows =====

    /// Follow a user. Following twice returns the existing edge.
    fn follow_user(&self, follow: NewFollow) -> StoreResult<Follow>;

    fn unfollow_user(&self, follower_id: UserId, following_id: UserId) -> StoreResult<bool>;

    fn get_follow(&self, follower_id: UserId, following_id: UserId) -> StoreResult<Option<Follow>>;

    /// Edges pointing at `user_id`
    fn get_followers_by_user(&self, user_id: UserId) -> StoreResult<Vec<Follow>>;

    /// Edges starting at `user_id`
    fn get_following_by_user(&self, user_id: UserId) -> StoreResult<Vec<Follow>>;

    fn count_followers(&self, user_id: UserId) -> StoreResult<usize>;

    fn count_following(&self, user_id: UserId) -> StoreResult<usize>;
}

/// Newest first, later inserts first on equal timestamps
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
