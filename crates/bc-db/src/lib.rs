//! Storage layer for the event ledger.
//!
//! Events live in a single SQLite table keyed by namespace. All access goes
//! through one shared [`StoreManager`], which hands out an `r2d2` pool and
//! rotates it after its TTL. [`Tracker`] is the facade the CLI talks to.
//!
//! # Consistency
//!
//! Single operations are atomic. Multi-step operations are not: moving an
//! event deletes it and then re-appends it, and a failure in between is
//! reported as [`DbError::PartialReplace`].

mod connector;
mod ledger;
mod pool;
mod tracker;

use thiserror::Error;

pub use connector::{
    ConnectionPool, PooledConnection, SqliteConnector, StoreConfig, StoreManager, open_store,
};
pub use ledger::Ledger;
pub use pool::{
    ConnectionManager, Connector, DEFAULT_TTL, Occupancy, PoolStats, PoolStatus,
};
pub use tracker::{Tracker, TrackerConfig};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// No usable store handle could be obtained.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Pool construction failed. The manager reports this to callers as
    /// [`DbError::Unavailable`].
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    /// Failed to encode an event as a ledger member.
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] bc_core::ValidationError),
    /// Proximity tolerance must not be negative.
    #[error("invalid proximity tolerance: {0}")]
    InvalidTolerance(i64),
    /// A move removed the old record but could not write the new one.
    #[error("moved event {event_id}: removed {removed} record(s) but failed to re-append")]
    PartialReplace {
        event_id: String,
        removed: usize,
        #[source]
        source: Box<DbError>,
    },
}
