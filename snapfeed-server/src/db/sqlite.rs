use anyhow::Result;

use snapfeed_types::{
    Comment, CommentId, Follow, Like, NewComment, NewFollow, NewLike, NewPost, NewUser, Post,
    PostId, ProfileUpdate, User, UserId,
};

use super::repositories::{
    CommentRepository, FollowRepository, LikeRepository, PostRepository, UserRepository,
};
use super::{Database, Storage, StoreResult};

/// Durable storage backend on SQLite, one repository per table
pub struct SqliteStorage {
    users: UserRepository,
    posts: PostRepository,
    likes: LikeRepository,
    comments: CommentRepository,
    follows: FollowRepository,
}

impl SqliteStorage {
    /// Build the backend over an already-initialized database
    pub fn new(db: &Database) -> Self {
        Self {
            users: UserRepository::new(db.pool.clone()),
            posts: PostRepository::new(db.pool.clone()),
            likes: LikeRepository::new(db.pool.clone()),
            comments: CommentRepository::new(db.pool.clone()),
            follows: FollowRepository::new(db.pool.clone()),
        }
    }

    /// Open (or create) the database at `path` and apply the schema
    pub fn open(path: &str) -> Result<Self> {
        let db = Database::new(path)?;
        db.initialize()?;
        Ok(Self::new(&db))
    }
}

impl Storage for SqliteStorage {
    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.users.create(user)
    }

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.users.get_by_id(id)
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.users.get_by_username(username)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.users.get_by_email(email)
    }

    fn get_users_by_search(&self, query: &str) -> StoreResult<Vec<User>> {
        self.users.search(query)
    }

    fn update_user_profile(&self, id: UserId, update: ProfileUpdate) -> StoreResult<Option<User>> {
        self.users.update_profile(id, update)
    }

    fn count_users(&self) -> StoreResult<usize> {
        self.users.count()
    }

    fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        self.posts.create(post)
    }

    fn get_post(&self, id: PostId) -> StoreResult<Option<Post>> {
        self.posts.get_by_id(id)
    }

    fn get_all_posts(&self) -> StoreResult<Vec<Post>> {
        self.posts.get_all()
    }

    fn get_posts_by_user(&self, user_id: UserId) -> StoreResult<Vec<Post>> {
        self.posts.get_by_user(user_id)
    }

    fn count_posts_by_user(&self, user_id: UserId) -> StoreResult<usize> {
        self.posts.count_by_user(user_id)
    }

    fn delete_post(&self, id: PostId) -> StoreResult<bool> {
        self.posts.delete(id)
    }

    fn like_post(&self, like: NewLike) -> StoreResult<Like> {
        self.likes.insert(like)
    }

    fn unlike_post(&self, user_id: UserId, post_id: PostId) -> StoreResult<bool> {
        self.likes.delete(user_id, post_id)
    }

    fn get_like(&self, user_id: UserId, post_id: PostId) -> StoreResult<Option<Like>> {
        self.likes.get(user_id, post_id)
    }

    fn get_likes_by_post(&self, post_id: PostId) -> StoreResult<Vec<Like>> {
        self.likes.get_by_post(post_id)
    }

    fn count_likes_by_post(&self, post_id: PostId) -> StoreResult<usize> {
        self.likes.count_by_post(post_id)
    }

    fn create_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        self.comments.create(comment)
    }

    fn get_comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        self.comments.get_by_id(id)
    }

    fn get_comments_by_post(&self, post_id: PostId) -> StoreResult<Vec<Comment>> {
        self.comments.get_by_post(post_id)
    }

    fn delete_comment(&self, id: CommentId) -> StoreResult<bool> {
        self.comments.delete(id)
    }

    fn follow_user(&self, follow: NewFollow) -> StoreResult<Follow> {
        self.follows.follow(follow)
    }

    fn unfollow_user(&self, follower_id: UserId, following_id: UserId) -> StoreResult<bool> {
        self.follows.unfollow(follower_id, following_id)
    }

    fn get_follow(&self, follower_id: UserId, following_id: UserId) -> StoreResult<Option<Follow>> {
        self.follows.get(follower_id, following_id)
    }

    fn get_followers_by_user(&self, user_id: UserId) -> StoreResult<Vec<Follow>> {
        self.follows.get_followers(user_id)
    }

    fn get_following_by_user(&self, user_id: UserId) -> StoreResult<Vec<Follow>> {
        self.follows.get_following(user_id)
    }

    fn count_followers(&self, user_id: UserId) -> StoreResult<usize> {
        self.follows.count_followers(user_id)
    }

    fn count_following(&self, user_id: UserId) -> StoreResult<usize> {
        self.follows.count_following(user_id)
    }
}
