//! Core error types for taskflow-core.
//!
//! This module defines the error hierarchy shared by the record model, the
//! persistence providers and the synchronization layer. Every failure that
//! reaches the UI boundary is a [`CoreError`] carrying a human-readable
//! message; none of them is fatal.

use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;
use crate::record::EntityKind;

/// Core error type for taskflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input rejected before any persistence was attempted
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Mutation target does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// Network, server or storage failure reported by a provider
    #[error("Operation failed: {0}")]
    Transport(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

impl CoreError {
    /// Whether this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

/// Provider failures collapse to `NotFound` or a generic transport failure.
impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            other => CoreError::Transport(other.to_string()),
        }
    }
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace-only
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    /// Required field is absent
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// Value outside the accepted set or format
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Invalid time range
    #[error("Invalid time range: end time ({end}) must be after start time ({start})")]
    InvalidTimeRange { start: String, end: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Table storage errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Row addressed by id does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// Record with the same id already exists
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: EntityKind, id: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not name a configuration entry
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
