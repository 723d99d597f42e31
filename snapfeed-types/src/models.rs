use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type PostId = i64;
pub type LikeId = i64;
pub type CommentId = i64;
pub type FollowId = i64;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// A stored user record, including the password hash.
///
/// Never serialized directly; convert to [`PublicUser`] before it leaves the server.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

/// User as exposed over the API (password stripped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            bio: user.bio,
            profile_image: user.profile_image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub image_url: String,
    pub caption: Option<String>,
    pub location: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: LikeId,
    pub user_id: UserId,
    pub post_id: PostId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub post_id: PostId,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: FollowId,
    pub follower_id: UserId,
    pub following_id: UserId,
}

// Insert payloads. IDs and timestamps are assigned by the store.

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: UserId,
    pub image_url: String,
    pub caption: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewLike {
    pub user_id: UserId,
    pub post_id: PostId,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: UserId,
    pub post_id: PostId,
    pub content: String,
}

#[derive(Debug, Clone, Copy)]
pub struct NewFollow {
    pub follower_id: UserId,
    pub following_id: UserId,
}

/// Editable profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

// Aggregated views

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithUser {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: PublicUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithDetails {
    #[serde(flatten)]
    pub post: Post,
    pub user: PublicUser,
    /// Number of likes at read time
    pub likes: usize,
    pub comments: Vec<CommentWithUser>,
    /// Viewer's like state, only present when a viewer is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithStats {
    #[serde(flatten)]
    pub user: PublicUser,
    pub post_count: usize,
    pub follower_count: usize,
    pub following_count: usize,
    /// Viewer's follow state, only present when a viewer is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<Post>>,
}

// Request/Response types for API

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub session_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}
