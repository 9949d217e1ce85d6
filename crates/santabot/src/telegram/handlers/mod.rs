//! Dispatcher schemas and handler plumbing

pub mod schema;
pub mod types;

pub use schema::{admin_schema, schema};
pub use types::{telegram_user_id, AdminDeps, HandlerDeps, HandlerError};
