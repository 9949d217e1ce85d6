//! Handler types and dependencies

use std::sync::Arc;

use santacore::DbPool;
use teloxide::types::{User, UserId};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies of the user bot handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }
}

/// Dependencies of the admin bot handlers
#[derive(Clone)]
pub struct AdminDeps {
    pub db_pool: Arc<DbPool>,
    /// The only user allowed into the admin bot
    pub admin_id: UserId,
}

impl AdminDeps {
    pub fn new(db_pool: Arc<DbPool>, admin_id: u64) -> Self {
        Self {
            db_pool,
            admin_id: UserId(admin_id),
        }
    }

    pub fn is_admin(&self, user: Option<&User>) -> bool {
        user.map(|u| u.id == self.admin_id).unwrap_or(false)
    }
}

/// Telegram user id as stored in the participants table.
///
/// Ids that do not fit the signed column are refused rather than clamped, so two
/// users can never end up sharing a row.
pub fn telegram_user_id(user: &User) -> Result<i64, HandlerError> {
    i64::try_from(user.id.0).map_err(|_| format!("Telegram user id {} does not fit into i64", user.id.0).into())
}
