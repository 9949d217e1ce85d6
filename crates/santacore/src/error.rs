use thiserror::Error;

use crate::config::ConfigError;
use crate::registration::ValidationError;

/// Centralized error types for the application
///
/// Store and transport failures are not retried anywhere; they travel up to the
/// dispatcher's error handler through this enum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(String),

    /// Rejected user input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The unique constraint on the Telegram user id rejected a write
    #[error("Participant for telegram user {telegram_user_id} already exists")]
    Conflict { telegram_user_id: i64 },

    /// No participant with this internal id
    #[error("Participant {0} not found")]
    NotFound(i64),

    /// Per-update database session failure
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Maps a UNIQUE violation on `participants.telegram_user_id` to `Conflict`.
    pub(crate) fn from_insert(err: rusqlite::Error, telegram_user_id: i64) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
                AppError::Conflict { telegram_user_id }
            }
            _ => AppError::Database(err),
        }
    }
}
