//! SQLite-backed [`Connector`].
//!
//! Each handle is an `r2d2` pool over one database file. New connections get
//! WAL mode and a busy timeout so concurrent writers queue instead of failing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::debug;

use crate::DbError;
use crate::pool::{ConnectionManager, Connector, Occupancy};

/// Alias for the handle shared by the manager.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Manager type used by the ledger.
pub type StoreManager = ConnectionManager<SqliteConnector>;

/// Pool sizing and timeouts.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Maximum pool size (default: 10).
    pub pool_size: u32,
    /// Connections kept open while idle (default: 2).
    pub min_idle: u32,
    /// Bound on waiting for a connection and on lock contention (default: 30s).
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            min_idle: 2,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u128,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))
    }
}

/// Opens pools over a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
    config: StoreConfig,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }
}

impl Connector for SqliteConnector {
    type Handle = ConnectionPool;

    fn connect(&self) -> Result<ConnectionPool, DbError> {
        let manager = SqliteConnectionManager::file(&self.path);
        let pool = Pool::builder()
            .max_size(self.config.pool_size.max(1))
            .min_idle(Some(self.config.min_idle.min(self.config.pool_size)))
            .connection_timeout(self.config.timeout)
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout_ms: self.config.timeout.as_millis(),
            }))
            .build(manager)?;

        let conn = pool.get()?;
        init_schema(&conn)?;
        debug!(path = %self.path.display(), "opened sqlite pool");
        Ok(pool)
    }

    fn probe(&self, pool: &ConnectionPool) -> Result<(), DbError> {
        let conn = pool.get()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn occupancy(&self, pool: &ConnectionPool) -> Occupancy {
        let state = pool.state();
        Occupancy {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }
}

/// Builds a shared manager for the database at `path`. Nothing is opened
/// until the first acquisition.
pub fn open_store(path: &Path, config: StoreConfig, ttl: Duration) -> Arc<StoreManager> {
    Arc::new(ConnectionManager::new(SqliteConnector::new(path, config), ttl))
}

/// Creates the ledger table. Idempotent.
///
/// `member` holds the JSON-encoded event; a member is unique within its
/// namespace, and `score` orders the namespace.
pub(crate) fn init_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS ledger (
            namespace TEXT NOT NULL,
            score INTEGER NOT NULL,
            member TEXT NOT NULL,
            PRIMARY KEY (namespace, member)
        );

        CREATE INDEX IF NOT EXISTS idx_ledger_score ON ledger(namespace, score);
        ",
    )?;
    Ok(())
}
