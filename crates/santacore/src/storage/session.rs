//! Per-update database session.
//!
//! A [`DbSession`] is opened for every inbound update and injected into the
//! handler tree. The pooled connection is taken lazily on first use and goes back
//! to the pool when the last clone of the session is dropped, whether the handler
//! succeeded or failed.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{AppError, AppResult};
use crate::storage::db::{get_connection, DbConnection, DbPool};

#[derive(Clone)]
pub struct DbSession {
    pool: DbPool,
    conn: Arc<Mutex<Option<DbConnection>>>,
}

impl std::fmt::Debug for DbSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSession")
            .field("acquired", &self.is_acquired())
            .finish()
    }
}

impl DbSession {
    /// Opens a session without touching the pool yet.
    pub fn open(pool: &DbPool) -> Self {
        Self {
            pool: pool.clone(),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a pooled connection is currently held.
    pub fn is_acquired(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Runs `f` on the session connection, acquiring it on first use.
    pub fn with_conn<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T>,
    {
        let mut guard = self.lock()?;
        if guard.is_none() {
            *guard = Some(get_connection(&self.pool)?);
        }
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(AppError::Session("connection was not acquired".to_string())),
        }
    }

    /// Runs `f` inside an `IMMEDIATE` transaction: commit on `Ok`, rollback on `Err`.
    ///
    /// `IMMEDIATE` takes the write lock up front, so concurrent writers queue on
    /// the busy timeout instead of failing on lock upgrade.
    pub fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AppResult<T>,
    {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Option<DbConnection>>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Session("session lock poisoned".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::db::create_pool;
    use tempfile::TempDir;

    fn pool() -> (TempDir, DbPool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.db");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    fn count(pool: &DbPool) -> i64 {
        get_connection(pool)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM participants", [], |row| row.get(0))
            .unwrap()
    }

    const INSERT: &str = "INSERT INTO participants (telegram_user_id, ifo, address, phone_number)
                          VALUES (1, 'Ivan', 'Main St 1', '+1000')";

    #[test]
    fn test_connection_is_acquired_lazily() {
        let (_dir, pool) = pool();
        let session = DbSession::open(&pool);
        assert!(!session.is_acquired());

        let one: i64 = session
            .with_conn(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(one, 1);
        assert!(session.is_acquired());
    }

    #[test]
    fn test_connection_returns_to_pool_after_last_clone_dropped() {
        let (_dir, pool) = pool();
        let session = DbSession::open(&pool);
        let clone = session.clone();
        clone.with_conn(|_| Ok(())).unwrap();

        drop(clone);
        assert!(session.is_acquired());
        drop(session);

        let state = pool.state();
        assert_eq!(state.idle_connections, state.connections);
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let (_dir, pool) = pool();
        let session = DbSession::open(&pool);
        session.transaction(|tx| Ok(tx.execute(INSERT, [])?)).unwrap();
        drop(session);

        assert_eq!(count(&pool), 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_err() {
        let (_dir, pool) = pool();
        let session = DbSession::open(&pool);
        let result: AppResult<()> = session.transaction(|tx| {
            tx.execute(INSERT, [])?;
            Err(AppError::NotFound(1))
        });
        assert!(matches!(result, Err(AppError::NotFound(1))));
        drop(session);

        assert_eq!(count(&pool), 0);
    }
}
