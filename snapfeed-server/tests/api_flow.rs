//! HTTP flows driven through the router without binding a socket.

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use snapfeed_server::api::{self, SESSION_HEADER};
use snapfeed_server::db::{MemStorage, SqliteStorage};
use snapfeed_server::state::AppState;

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        Self::with_state(AppState::in_memory())
    }

    fn with_state(state: AppState) -> Self {
        Self {
            router: api::router(state),
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(SESSION_HEADER, token);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).to_string())
            })
        };
        Ok((status, value))
    }

    async fn register(&self, username: &str) -> Result<Value> {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "password": "password123",
                    "fullName": format!("{} Example", username),
                    "email": format!("{}@example.com", username),
                })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "register {}: {}", username, body);
        Ok(body)
    }

    async fn login(&self, username: &str) -> Result<String> {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": "password123" })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "login {}: {}", username, body);
        Ok(body["sessionToken"].as_str().unwrap_or_default().to_string())
    }

    async fn signup(&self, username: &str) -> Result<String> {
        self.register(username).await?;
        self.login(username).await
    }

    async fn create_post(&self, token: &str, caption: &str) -> Result<i64> {
        let (status, body) = self
            .send(
                "POST",
                "/api/posts",
                Some(token),
                Some(json!({
                    "imageUrl": "https://example.com/photo.jpg",
                    "caption": caption,
                })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "create post: {}", body);
        Ok(body["id"].as_i64().unwrap_or_default())
    }
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_register_login_logout() -> Result<()> {
    let app = TestApp::new();

    let user = app.register("jessica").await?;
    assert_eq!(user["username"], "jessica");
    assert_eq!(user["fullName"], "jessica Example");
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());

    let token = app.login("jessica").await?;
    let (status, me) = app.send("GET", "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "jessica");

    let (status, _) = app.send("POST", "/api/auth/logout", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("GET", "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() -> Result<()> {
    let app = TestApp::new();
    app.register("sam").await?;

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "Sam",
                "password": "pw",
                "fullName": "Sam Again",
                "email": "sam2@example.com",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"], "Username already taken");

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "samuel",
                "password": "pw",
                "fullName": "Samuel",
                "email": "SAM@example.com",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"], "Email already registered");

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "bad name",
                "password": "pw",
                "fullName": "Bad",
                "email": "bad@example.com",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_login_with_wrong_password() -> Result<()> {
    let app = TestApp::new();
    app.register("mike87").await?;

    for username in ["mike87", "ghost"] {
        let (status, body) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": "nope" })),
            )
            .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["details"], "Invalid username or password");
    }
    Ok(())
}

#[tokio::test]
async fn test_mutations_require_session() -> Result<()> {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            "POST",
            "/api/posts",
            None,
            Some(json!({ "imageUrl": "https://example.com/a.jpg" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", "/api/feed", Some("not-a-token"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_follow_like_feed_flow() -> Result<()> {
    let app = TestApp::new();
    let u1 = app.signup("u1").await?;
    let u2 = app.signup("u2").await?;

    let (status, stats) = app
        .send("POST", "/api/users/u2/follow", Some(&u1), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["isFollowing"], true);
    assert_eq!(stats["followerCount"], 1);
    assert_eq!(stats["posts"], json!([]));

    let p1 = app.create_post(&u2, "hi").await?;

    let (status, feed) = app.send("GET", "/api/feed", Some(&u1), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed.as_array().map(Vec::len), Some(1));
    assert_eq!(feed[0]["id"], p1);
    assert_eq!(feed[0]["caption"], "hi");
    assert_eq!(feed[0]["user"]["username"], "u2");
    assert_eq!(feed[0]["isLiked"], false);

    let (status, liked) = app
        .send("POST", &format!("/api/posts/{}/like", p1), Some(&u1), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liked["isLiked"], true);
    assert_eq!(liked["likes"], 1);

    // Liking again changes nothing
    let (_, liked) = app
        .send("POST", &format!("/api/posts/{}/like", p1), Some(&u1), None)
        .await?;
    assert_eq!(liked["likes"], 1);

    let (_, feed) = app.send("GET", "/api/feed", Some(&u1), None).await?;
    assert_eq!(feed[0]["isLiked"], true);

    let (status, stats) = app
        .send("DELETE", "/api/users/u2/follow", Some(&u1), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["isFollowing"], false);
    assert_eq!(stats["posts"][0]["id"], p1);

    let (_, feed) = app.send("GET", "/api/feed", Some(&u1), None).await?;
    assert_eq!(feed, json!([]));

    let (status, unliked) = app
        .send("DELETE", &format!("/api/posts/{}/like", p1), Some(&u1), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unliked["isLiked"], false);
    assert_eq!(unliked["likes"], 0);
    Ok(())
}

#[tokio::test]
async fn test_cannot_follow_yourself() -> Result<()> {
    let app = TestApp::new();
    let token = app.signup("alex_t").await?;

    let (status, body) = app
        .send("POST", "/api/users/alex_t/follow", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Cannot follow yourself");

    let (status, _) = app
        .send("POST", "/api/users/nobody/follow", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_delete_post_ownership() -> Result<()> {
    let app = TestApp::new();
    let owner = app.signup("owner").await?;
    let other = app.signup("other").await?;
    let post = app.create_post(&owner, "mine").await?;
    let uri = format!("/api/posts/{}", post);

    let (status, _) = app.send("DELETE", &uri, Some(&other), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("DELETE", &uri, Some(&owner), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.send("GET", &uri, None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send("DELETE", &uri, Some(&owner), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("GET", "/api/posts/abc", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_comments_flow() -> Result<()> {
    let app = TestApp::new();
    let author = app.signup("emma_j").await?;
    let commenter = app.signup("david_k").await?;
    let post = app.create_post(&author, "art").await?;
    let comments_uri = format!("/api/posts/{}/comments", post);

    let (status, _) = app
        .send("POST", &comments_uri, Some(&commenter), Some(json!({ "content": "   " })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = app
        .send(
            "POST",
            &comments_uri,
            Some(&commenter),
            Some(json!({ "content": "Great shot! 📸" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["content"], "Great shot! 📸");
    assert_eq!(created["user"]["username"], "david_k");
    let comment_id = created["id"].as_i64().unwrap_or_default();

    let (status, listed) = app.send("GET", &comments_uri, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (_, details) = app
        .send("GET", &format!("/api/posts/{}", post), None, None)
        .await?;
    assert_eq!(details["comments"][0]["id"], comment_id);
    assert!(details.get("isLiked").is_none());

    let comment_uri = format!("{}/{}", comments_uri, comment_id);
    let (status, _) = app.send("DELETE", &comment_uri, Some(&author), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("DELETE", &comment_uri, Some(&commenter), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = app.send("GET", &comments_uri, None, None).await?;
    assert_eq!(listed, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_profile_view_and_edit() -> Result<()> {
    let app = TestApp::new();
    let sarah = app.signup("sarah_p").await?;
    let mike = app.signup("mike87").await?;
    app.create_post(&sarah, "coffee").await?;
    app.send("POST", "/api/users/sarah_p/follow", Some(&mike), None)
        .await?;

    let (status, profile) = app
        .send("GET", "/api/users/sarah_p", Some(&mike), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["postCount"], 1);
    assert_eq!(profile["followerCount"], 1);
    assert_eq!(profile["followingCount"], 0);
    assert_eq!(profile["isFollowing"], true);
    assert_eq!(profile["posts"].as_array().map(Vec::len), Some(1));

    // Anonymous viewers get no follow state
    let (_, anonymous) = app.send("GET", "/api/users/sarah_p", None, None).await?;
    assert!(anonymous.get("isFollowing").is_none());

    let edit = json!({ "bio": "Coffee enthusiast ☕" });
    let (status, _) = app
        .send("PUT", "/api/users/sarah_p/profile", Some(&mike), Some(edit.clone()))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .send("PUT", "/api/users/sarah_p/profile", Some(&sarah), Some(edit))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["bio"], "Coffee enthusiast ☕");
    assert_eq!(updated["fullName"], "sarah_p Example");
    assert_eq!(updated["posts"][0]["caption"], "coffee");

    let (status, _) = app.send("GET", "/api/users/nobody", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_search_users() -> Result<()> {
    let app = TestApp::new();
    app.register("jessica").await?;
    app.register("mike87").await?;

    let (status, hits) = app
        .send("GET", "/api/users/search?q=JESS", None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().map(Vec::len), Some(1));
    assert_eq!(hits[0]["username"], "jessica");

    let (status, _) = app.send("GET", "/api/users/search?q=", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.send("GET", "/api/users/search", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_list_posts_marks_viewer_likes() -> Result<()> {
    let app = TestApp::new();
    let a = app.signup("poster").await?;
    let b = app.signup("liker").await?;
    let first = app.create_post(&a, "first").await?;
    let second = app.create_post(&a, "second").await?;
    app.send("POST", &format!("/api/posts/{}/like", first), Some(&b), None)
        .await?;

    let (status, posts) = app.send("GET", "/api/posts", Some(&b), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posts[0]["id"], second);
    assert_eq!(posts[0]["isLiked"], false);
    assert_eq!(posts[1]["id"], first);
    assert_eq!(posts[1]["isLiked"], true);

    let (_, anonymous) = app.send("GET", "/api/posts", None, None).await?;
    assert!(anonymous[0].get("isLiked").is_none());
    Ok(())
}

#[tokio::test]
async fn test_flow_on_sqlite_backend() -> Result<()> {
    let store = SqliteStorage::open(":memory:")?;
    let app = TestApp::with_state(AppState::new(Arc::new(store)));

    let u1 = app.signup("u1").await?;
    let u2 = app.signup("u2").await?;
    app.send("POST", "/api/users/u2/follow", Some(&u1), None)
        .await?;
    let post = app.create_post(&u2, "hi").await?;

    let (_, feed) = app.send("GET", "/api/feed", Some(&u1), None).await?;
    assert_eq!(feed[0]["id"], post);

    let (status, _) = app
        .send("DELETE", &format!("/api/posts/{}", post), Some(&u2), None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, feed) = app.send("GET", "/api/feed", Some(&u1), None).await?;
    assert_eq!(feed, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_seeded_store_serves_feeds() -> Result<()> {
    let store = Arc::new(MemStorage::new());
    snapfeed_server::seed::seed_sample_data(store.as_ref())?;
    let app = TestApp::with_state(AppState::new(store));

    let token = app.login("jessica").await?;
    let (status, feed) = app.send("GET", "/api/feed", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(feed.as_array().map(|items| !items.is_empty()).unwrap_or(false));
    Ok(())
}
