//! Santacore - storage, configuration and the registration flow shared by the
//! Secret Santa bots.
//!
//! # Module Structure
//!
//! - `config`: environment configuration, fails hard on missing credentials
//! - `error`: centralized error types
//! - `logging`: console + file logger
//! - `types`: delivery option and its stable database discriminant
//! - `registration`: the registration dialog as a transport-free state machine
//! - `storage`: connection pool, migrations, per-update sessions, participant queries
//! - `export`: participant dumps (CSV, JSON, TXT)

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod registration;
pub mod storage;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError};
pub use error::{AppError, AppResult};
pub use registration::{
    CompletedRegistration, RegistrationDraft, RegistrationEvent, RegistrationFlow, RegistrationStep, Transition,
    ValidationError,
};
pub use storage::{create_pool, get_connection, DbConnection, DbPool, DbSession, Participant};
pub use types::DeliveryOption;
