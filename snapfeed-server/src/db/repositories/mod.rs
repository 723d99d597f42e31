mod user_repository;
mod post_repository;
mod like_repository;
mod comment_repository;
mod follow_repository;

pub use user_repository::UserRepository;
pub use post_repository::PostRepository;
pub use like_repository::LikeRepository;
pub use comment_repository::CommentRepository;
pub use follow_repository::FollowRepository;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;

/// Current time at the precision timestamps are stored with
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
