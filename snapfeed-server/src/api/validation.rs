use once_cell::sync::Lazy;
use regex::Regex;

use super::ApiError;

/// 1-30 letters, digits, underscores or dots
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.]{1,30}$").expect("Failed to compile username regex")
});

/// Trim a required field, rejecting blank input
pub fn require(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional field, treating blank input as absent
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Username must be 1-30 characters of letters, digits, '_' or '.'".to_string(),
        ))
    }
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Invalid email address".to_string()))
    }
}
