use anyhow::{Context, Result};
use std::sync::Arc;

use snapfeed_types::UserId;

use crate::config::{Settings, StorageBackend};
use crate::db::{MemStorage, SqliteStorage, Storage};
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub session_manager: SessionManager,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            store,
            session_manager: SessionManager::new(),
        }
    }

    /// State over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemStorage::new()))
    }

    /// Build the storage backend selected in settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store: Arc<dyn Storage> = match settings.storage.backend {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory storage");
                Arc::new(MemStorage::new())
            }
            StorageBackend::Sqlite => {
                tracing::info!("Using SQLite storage at {}", settings.database.path);
                let sqlite = SqliteStorage::open(&settings.database.path)
                    .context("Failed to open SQLite storage")?;
                Arc::new(sqlite)
            }
        };
        Ok(Self::new(store))
    }

    /// Get authenticated user ID from session token
    pub fn get_authenticated_user_id_from_token(&self, token: &str) -> Option<UserId> {
        self.session_manager.validate_session(token).ok()
    }
}
