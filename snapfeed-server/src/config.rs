use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    /// SQLite file path, or ":memory:"
    pub path: String,
}

/// Which `Storage` implementation backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: StorageBackend,
    /// Seed sample users and posts when the store starts empty
    pub seed_sample_data: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub storage: Storage,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "snapfeed.db")?
            .set_default("storage.backend", "memory")?
            .set_default("storage.seed_sample_data", true)?;

        // 1. Optional settings.toml, in the working directory or the crate directory
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        let dev_path = PathBuf::from("snapfeed-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        // 2. Environment variables (highest priority)
        let overrides = [
            ("HOST", "server.host"),
            ("PORT", "server.port"),
            ("DATABASE_PATH", "database.path"),
            ("STORAGE_BACKEND", "storage.backend"),
            ("SEED_SAMPLE_DATA", "storage.seed_sample_data"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }
}
