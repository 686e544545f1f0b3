mod config;
pub mod database;
mod local_store;
pub mod migrations;

pub use config::{
    CalendarConfig, Config, LocalConfig, ProviderConfig, ProviderMode, RemoteConfig, ServerConfig,
};
pub use database::Database;
pub use local_store::{KeyUsage, LocalStore, StorageStats, SETTINGS_KEY, STORAGE_KEYS};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/taskflow[-dev]/` based on TASKFLOW_ENV.
///
/// Set TASKFLOW_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TASKFLOW_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("taskflow-dev")
    } else {
        base_dir.join("taskflow")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
