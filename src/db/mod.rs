pub mod migrations;
pub mod queries;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use rusqlite::{Connection, TransactionBehavior};

use crate::errors::AppError;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Shared handle to the store. All access goes through one connection, so
/// units of work never interleave.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn with_busy_timeout(self, timeout: Duration) -> anyhow::Result<Self> {
        self.lock()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?
            .busy_timeout(timeout)
            .context("failed to set busy timeout")?;
        Ok(self)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database connection lock poisoned".to_string()))
    }

    /// Plain read outside a transaction.
    pub fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Runs `f` inside an IMMEDIATE transaction. Commits when `f` returns
    /// `Ok`; any error drops the transaction, which rolls it back.
    pub fn unit_of_work<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_of_work_rolls_back_on_error() {
        let db = Db::new(init_db(":memory:").unwrap());

        let result: Result<(), AppError> = db.unit_of_work(|conn| {
            conn.execute(
                "INSERT INTO airports (name, is_active, created_at) VALUES ('SYD', 1, '2025-01-01T00:00:00.000000Z')",
                [],
            )?;
            Err(AppError::validation("abort"))
        });
        assert!(result.is_err());

        let count: i64 = db
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM airports", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unit_of_work_commits() {
        let db = Db::new(init_db(":memory:").unwrap());
        db.unit_of_work(|conn| {
            conn.execute(
                "INSERT INTO airports (name, is_active, created_at) VALUES ('MEL', 1, '2025-01-01T00:00:00.000000Z')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let count: i64 = db
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM airports", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
    }
}
