mod blocking;
mod config;
mod data;
pub mod database;
mod study;
mod usage;
mod words;

pub use config::{Config, LoggingConfig, MonitoringConfig, SearchConfig, StudyConfig};
pub use data::StorageData;
pub use database::{Database, SharedDatabase};
pub use usage::MAX_USAGE_SAMPLES;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Fixed keys of the `kv` table.
pub mod keys {
    pub const WORDS: &str = "words";
    pub const PROGRESS: &str = "progress";
    pub const BLOCKING_SETTINGS: &str = "blocking_settings";
    pub const APP_SETTINGS: &str = "app_settings";
    pub const STUDY_SESSIONS: &str = "study_sessions";
    pub const LAST_SYNC: &str = "last_sync";
    pub const USAGE_SESSIONS: &str = "usage_sessions";
    pub const USAGE_SAMPLES: &str = "usage_samples";

    pub const ALL: [&str; 8] = [
        WORDS,
        PROGRESS,
        BLOCKING_SETTINGS,
        APP_SETTINGS,
        STUDY_SESSIONS,
        LAST_SYNC,
        USAGE_SESSIONS,
        USAGE_SAMPLES,
    ];
}

/// Returns the data directory, creating it if needed.
///
/// `WORDBLOCK_DATA_DIR` overrides the location. Otherwise
/// `~/.config/wordblock[-dev]/`, with the `-dev` suffix when
/// `WORDBLOCK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("WORDBLOCK_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("WORDBLOCK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("wordblock-dev")
            } else {
                base_dir.join("wordblock")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
