//! Storage layer: connection pool, embedded migrations, per-update sessions and
//! participant queries.

pub mod db;
pub mod migrations;
pub mod participants;
pub mod session;

pub use db::{create_pool, get_connection, DbConnection, DbPool};
pub use migrations::run_migrations;
pub use participants::{EditableField, Participant, SaveOutcome};
pub use session::DbSession;
