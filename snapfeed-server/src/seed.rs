use anyhow::{Context, Result};

use snapfeed_types::{NewComment, NewFollow, NewLike, NewPost, NewUser, UserId};

use crate::db::Storage;
use crate::password::hash_password;

/// Password shared by every sample account
pub const SAMPLE_PASSWORD: &str = "password123";

const PROFILE_IMAGES: [&str; 6] = [
    "https://images.unsplash.com/photo-1494790108377-be9c29b29330",
    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d",
    "https://images.unsplash.com/photo-1438761681033-6461ffad8d80",
    "https://images.unsplash.com/photo-1500648767791-00dcc994a43e",
    "https://images.unsplash.com/photo-1534528741775-53994a69daeb",
    "https://images.unsplash.com/photo-1539571696357-5a69c17a67c6",
];

/// (username, full name, email, bio)
const SAMPLE_USERS: [(&str, &str, &str, &str); 6] = [
    (
        "jessica",
        "Jessica Parker",
        "jessica@example.com",
        "Photographer & traveler ✈️ | Based in San Francisco",
    ),
    ("mike87", "Mike Johnson", "mike@example.com", "Music lover | Foodie | Adventurer"),
    ("sarah_p", "Sarah Peterson", "sarah@example.com", "Coffee enthusiast ☕ | Los Angeles"),
    ("alex_t", "Alex Thompson", "alex@example.com", "Sneakerhead 👟 | Fashion | NYC"),
    ("emma_j", "Emma Jones", "emma@example.com", "Artist | Designer | Chicago"),
    ("david_k", "David Kim", "david@example.com", "Tech & fitness | Seattle"),
];

/// (image url, caption)
const SAMPLE_POSTS: [(&str, &str); 8] = [
    (
        "https://images.unsplash.com/photo-1543039625-14cbd3802e7d",
        "Beautiful day at the beach! 🌊 #summer #beach #vacation",
    ),
    (
        "https://images.unsplash.com/photo-1516762689617-e1cffcef479d",
        "Just got these new shoes! What do you think? #fashion #sneakers",
    ),
    (
        "https://images.unsplash.com/photo-1522276498395-f4f68f7f8454",
        "Morning coffee is the best way to start the day ☕️ #coffee #morning",
    ),
    (
        "https://images.unsplash.com/photo-1513104890138-7c749659a591",
        "Delicious dinner tonight! 🍽️ #foodie #dinner",
    ),
    (
        "https://images.unsplash.com/photo-1504674900247-0877df9cc836",
        "Exploring the city today 🏙️ #urban #adventure",
    ),
    (
        "https://images.unsplash.com/photo-1515886657613-9f3515b0c78f",
        "Nature walks are my therapy 🌳 #nature #hiking",
    ),
    (
        "https://images.unsplash.com/photo-1516762689617-e1cffcef479d",
        "Weekend vibes 🎵 #weekend #music",
    ),
    (
        "https://images.unsplash.com/photo-1522276498395-f4f68f7f8454",
        "New haircut! What do you think? 💇 #newlook #selfie",
    ),
];

const LOCATIONS: [&str; 6] = [
    "San Francisco, CA",
    "New York, NY",
    "Los Angeles, CA",
    "Chicago, IL",
    "Seattle, WA",
    "Boston, MA",
];

const COMMENTS: [&str; 6] = [
    "This looks amazing! 😍",
    "Love it! 👏",
    "Great shot! 📸",
    "Wow, incredible! ✨",
    "So cool! 🙌",
    "Beautiful! ❤️",
];

/// Populate an empty store with sample users, posts and interactions.
///
/// Does nothing if any user already exists. Returns whether data was written.
pub fn seed_sample_data(store: &dyn Storage) -> Result<bool> {
    if store.count_users()? > 0 {
        tracing::debug!("Store already has users, skipping sample data");
        return Ok(false);
    }

    // One hash for every account keeps startup fast
    let password_hash = hash_password(SAMPLE_PASSWORD)?;

    let mut user_ids: Vec<UserId> = Vec::with_capacity(SAMPLE_USERS.len());
    for (i, (username, full_name, email, bio)) in SAMPLE_USERS.iter().enumerate() {
        let user = store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: password_hash.clone(),
                full_name: full_name.to_string(),
                email: email.to_string(),
                bio: Some(bio.to_string()),
                profile_image: Some(PROFILE_IMAGES[i].to_string()),
            })
            .with_context(|| format!("Failed to seed user {}", username))?;
        user_ids.push(user.id);
    }

    let mut post_ids = Vec::with_capacity(SAMPLE_POSTS.len());
    for (i, (image_url, caption)) in SAMPLE_POSTS.iter().enumerate() {
        let post = store.create_post(NewPost {
            user_id: user_ids[i % user_ids.len()],
            image_url: image_url.to_string(),
            caption: Some(caption.to_string()),
            location: Some(LOCATIONS[i % LOCATIONS.len()].to_string()),
        })?;
        post_ids.push(post.id);
    }

    // Fixed patterns stand in for randomness so every seeded store looks the same
    let mut follows = 0;
    for (i, follower_id) in user_ids.iter().enumerate() {
        for (j, following_id) in user_ids.iter().enumerate() {
            if i != j && (i + j) % 3 != 0 {
                store.follow_user(NewFollow {
                    follower_id: *follower_id,
                    following_id: *following_id,
                })?;
                follows += 1;
            }
        }
    }

    let mut likes = 0;
    let mut comments = 0;
    for (i, post_id) in post_ids.iter().enumerate() {
        for (j, user_id) in user_ids.iter().enumerate() {
            if (i * 7 + j * 3) % 5 < 3 {
                store.like_post(NewLike {
                    user_id: *user_id,
                    post_id: *post_id,
                })?;
                likes += 1;
            }
            if (i + 2 * j) % 5 == 0 {
                store.create_comment(NewComment {
                    user_id: *user_id,
                    post_id: *post_id,
                    content: COMMENTS[(i + j) % COMMENTS.len()].to_string(),
                })?;
                comments += 1;
            }
        }
    }

    tracing::info!(
        "Seeded {} users, {} posts, {} follows, {} likes, {} comments",
        user_ids.len(),
        post_ids.len(),
        follows,
        likes,
        comments
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::feed::get_feed_for_user;
    use crate::db::MemStorage;
    use crate::password::verify_password;

    #[test]
    fn test_seed_populates_empty_store() {
        let store = MemStorage::new();
        assert!(seed_sample_data(&store).unwrap());

        assert_eq!(store.count_users().unwrap(), 6);
        assert_eq!(store.get_all_posts().unwrap().len(), 8);

        let jessica = store.get_user_by_username("jessica").unwrap().unwrap();
        assert!(verify_password(SAMPLE_PASSWORD, &jessica.password_hash).unwrap());
        assert_eq!(store.get_posts_by_user(jessica.id).unwrap().len(), 2);

        // Every sample user follows someone, so nobody starts with an empty feed
        for (username, ..) in SAMPLE_USERS {
            let user = store.get_user_by_username(username).unwrap().unwrap();
            assert!(!store.get_following_by_user(user.id).unwrap().is_empty());
            assert!(!get_feed_for_user(&store, user.id).unwrap().is_empty());
        }
    }

    #[test]
    fn test_seed_skips_non_empty_store() {
        let store = MemStorage::new();
        assert!(seed_sample_data(&store).unwrap());
        assert!(!seed_sample_data(&store).unwrap());
        assert_eq!(store.count_users().unwrap(), 6);
    }
}
