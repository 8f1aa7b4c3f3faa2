//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for performance and concurrency (WAL mode), and running migrations.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;

use super::migrations;
use crate::Error;

/// Source of "now" for timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;
     PRAGMA busy_timeout=5000;";

/// SQLite-backed address store.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Cloning shares the connection.
#[derive(Clone)]
pub struct SqliteStore {
    pub(crate) conn: Connection,
    pub(crate) now: Clock,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening address database");

        let conn = Connection::open(path)
            .await
            .map_err(|e| Error::wrap("sqlite.open", e.to_string()))?;

        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    ///
    /// Creates a temporary in-memory SQLite database with the same
    /// pragma configuration as file-based databases.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::wrap("sqlite.open", e.to_string()))?;

        Self::init(conn).await
    }

    /// Replace the clock used to stamp `created_at`/`updated_at`.
    pub fn with_clock(mut self, now: Clock) -> Self {
        self.now = now;
        self
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await.map_err(Error::from)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, now: Arc::new(Utc::now) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = SqliteStore::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
    }

    #[tokio::test]
    async fn test_open_file() {
        let dir = std::env::temp_dir().join(format!("correios-cep-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("open.sqlite");

        let db = SqliteStore::open(&path).await.unwrap();
        drop(db);
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
