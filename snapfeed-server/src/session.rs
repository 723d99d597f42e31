use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use snapfeed_types::UserId;

/// Sessions stay valid for this many days after login
const SESSION_LIFETIME_DAYS: i64 = 30;

#[derive(Debug, Clone)]
struct Session {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

/// In-memory session manager for token-based authentication
///
/// Manages user sessions, including:
/// - Session creation with UUID v4 tokens
/// - Session validation with expiry checking
/// - Session deletion (logout)
/// - Cleanup of expired sessions
///
/// Sessions do not survive a restart.
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| anyhow!("Session store lock poisoned"))
    }

    /// Create a new session for a user
    ///
    /// # Returns
    /// * `Result<String>` - The session token on success
    pub fn create_session(&self, user_id: UserId) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(SESSION_LIFETIME_DAYS);

        self.lock()?
            .insert(token.clone(), Session { user_id, expires_at });

        tracing::info!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Validate a session token and return the associated user ID
    ///
    /// An expired session is removed and reported as invalid.
    pub fn validate_session(&self, token: &str) -> Result<UserId> {
        let mut sessions = self.lock()?;
        let Some(session) = sessions.get(token).cloned() else {
            bail!("Session not found");
        };

        if Utc::now() > session.expires_at {
            sessions.remove(token);
            bail!("Session has expired");
        }

        Ok(session.user_id)
    }

    /// Delete a session (logout). Returns whether it existed.
    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let removed = self.lock()?.remove(token).is_some();
        if removed {
            tracing::info!("Deleted session");
        }
        Ok(removed)
    }

    /// Remove all sessions past their expiry time
    ///
    /// # Returns
    /// * `Result<usize>` - The number of sessions deleted
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let now = Utc::now();
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at >= now);
        let removed = before - sessions.len();

        if removed > 0 {
            tracing::info!("Cleaned up {} expired sessions", removed);
        }
        Ok(removed)
    }

    #[cfg(test)]
    fn expire(&self, token: &str) {
        if let Some(session) = self.lock().unwrap().get_mut(token) {
            session.expires_at = Utc::now() - Duration::days(1);
        }
    }
}
