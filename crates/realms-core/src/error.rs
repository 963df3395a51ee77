//! Core error types for realms-core.
//!
//! One enum per concern, built with thiserror. [`CoreError`] wraps the others
//! so orchestration code can use `?` across storage, config and engine calls.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for realms-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Gathering and leveling rule violations
    #[error("Gathering error: {0}")]
    Gathering(#[from] GatheringError),
}

impl CoreError {
    /// True when the caller may retry the same operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Gathering(err) => err.is_retryable(),
            CoreError::Database(DatabaseError::Locked) => true,
            _ => false,
        }
    }
}

/// Database-specific errors.
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

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be decoded
    #[error("Corrupt value in column '{column}': {message}")]
    CorruptValue { column: String, message: String },

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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors raised by the gathering engine and the session orchestration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatheringError {
    /// Rejected before any computation; no state was changed.
    #[error("Invalid value for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("No active gathering session for character '{character_id}'")]
    SessionNotFound { character_id: String },

    #[error("Character '{character_id}' already has an active gathering session")]
    SessionAlreadyActive { character_id: String },

    #[error("Unknown material '{material_id}'")]
    MaterialNotFound { material_id: String },

    #[error("Gathering is not complete ({gathered}/{goal})")]
    NotComplete { gathered: u32, goal: u32 },

    #[error("Skill level {current} is below the required level {required}")]
    LevelTooLow { required: u32, current: u32 },

    /// The session changed or vanished between read and write.
    #[error("Gathering session for character '{character_id}' was modified concurrently")]
    ConcurrentModification { character_id: String },
}

impl GatheringError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        GatheringError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GatheringError::ConcurrentModification { .. })
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
