//! Shared, TTL-rotated connection handle.
//!
//! [`ConnectionManager`] owns at most one handle produced by a [`Connector`].
//! The common path takes the read lock only; when the handle is missing or
//! older than the TTL, the caller takes the write lock, re-checks, and only
//! then closes the stale handle and creates a new one. Concurrent callers
//! that hit an expired handle at the same time therefore produce exactly one
//! new handle and all receive it.
//!
//! # Failure Semantics
//!
//! Creation and liveness-probe failures surface as [`DbError::Unavailable`]
//! and leave no handle installed. Nothing is retried here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::DbError;

/// Default time-to-live of a shared handle (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Creates, probes, and closes handles to the backing store.
pub trait Connector: Send + Sync {
    /// The shared handle type, e.g. a connection pool.
    type Handle: Send + Sync;

    /// Opens a new handle.
    fn connect(&self) -> Result<Self::Handle, DbError>;

    /// Verifies that a freshly opened handle can reach the store.
    fn probe(&self, handle: &Self::Handle) -> Result<(), DbError>;

    /// Reports connection occupancy for a handle.
    fn occupancy(&self, _handle: &Self::Handle) -> Occupancy {
        Occupancy::default()
    }

    /// Releases the manager's reference to a handle. Callers still holding
    /// clones keep it alive until they drop them.
    fn close(&self, handle: Arc<Self::Handle>) {
        drop(handle);
    }
}

/// Connection counts reported by a handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Whether a handle is currently installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolStatus {
    Connected,
    Disconnected,
}

/// Snapshot of the manager for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub status: PoolStatus,
    pub age_ms: Option<u64>,
    pub ttl_remaining_ms: Option<u64>,
    pub ttl_ms: u64,
    /// Acquisitions served by the installed handle.
    pub hits: u64,
    /// Acquisitions that found the handle missing or expired.
    pub misses: u64,
    /// Handles successfully created.
    pub created: u64,
    /// Failed creations or probes.
    pub failures: u64,
    #[serde(flatten)]
    pub occupancy: Occupancy,
}

#[derive(Debug)]
struct Slot<H> {
    handle: Arc<H>,
    created_at: Instant,
}

impl<H> Slot<H> {
    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    created: AtomicU64,
    failures: AtomicU64,
}

/// Owner of the single shared handle.
///
/// Share it across threads with `Arc<ConnectionManager<_>>`.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    ttl: Duration,
    slot: RwLock<Option<Slot<C::Handle>>>,
    counters: Counters,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, ttl: Duration) -> Self {
        Self {
            connector,
            ttl,
            slot: RwLock::new(None),
            counters: Counters::default(),
        }
    }

    /// Returns the shared handle, creating or refreshing it when needed.
    pub fn acquire(&self) -> Result<Arc<C::Handle>, DbError> {
        self.acquire_at(Instant::now())
    }

    /// [`acquire`](Self::acquire) with an explicit clock reading.
    pub fn acquire_at(&self, now: Instant) -> Result<Arc<C::Handle>, DbError> {
        if let Some(handle) = self.fresh_handle(&self.read_slot(), now) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(handle);
        }

        let mut slot = self.write_slot();
        // Another caller may have refreshed while we waited for the write lock.
        if let Some(handle) = self.fresh_handle(&slot, now) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(handle);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        if let Some(stale) = slot.take() {
            info!(
                age_ms = duration_ms(stale.age(now)),
                "closing expired store handle"
            );
            self.connector.close(stale.handle);
        }

        let handle = self.create()?;
        *slot = Some(Slot {
            handle: Arc::clone(&handle),
            created_at: now,
        });
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        info!(ttl_secs = self.ttl.as_secs(), "created store handle");
        Ok(handle)
    }

    /// Closes the handle, if any. The next acquisition creates a new one.
    pub fn release(&self) {
        let mut slot = self.write_slot();
        if let Some(current) = slot.take() {
            info!("closing store handle");
            self.connector.close(current.handle);
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.stats_at(Instant::now())
    }

    /// [`stats`](Self::stats) with an explicit clock reading.
    pub fn stats_at(&self, now: Instant) -> PoolStats {
        let slot = self.read_slot();
        let (status, age, occupancy) = match slot.as_ref() {
            Some(current) => (
                PoolStatus::Connected,
                Some(current.age(now)),
                self.connector.occupancy(&current.handle),
            ),
            None => (PoolStatus::Disconnected, None, Occupancy::default()),
        };

        PoolStats {
            status,
            age_ms: age.map(duration_ms),
            ttl_remaining_ms: age.map(|age| duration_ms(self.ttl.saturating_sub(age))),
            ttl_ms: duration_ms(self.ttl),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            created: self.counters.created.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            occupancy,
        }
    }

    fn create(&self) -> Result<Arc<C::Handle>, DbError> {
        let handle = self.connector.connect().map_err(|err| self.unavailable(&err))?;
        if let Err(err) = self.connector.probe(&handle) {
            self.connector.close(Arc::new(handle));
            return Err(self.unavailable(&err));
        }
        debug!("store handle passed liveness probe");
        Ok(Arc::new(handle))
    }

    fn unavailable(&self, err: &DbError) -> DbError {
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        warn!(error = %err, "store handle unavailable");
        DbError::Unavailable {
            reason: err.to_string(),
        }
    }

    fn fresh_handle(
        &self,
        slot: &Option<Slot<C::Handle>>,
        now: Instant,
    ) -> Option<Arc<C::Handle>> {
        slot.as_ref()
            .filter(|current| current.age(now) < self.ttl)
            .map(|current| Arc::clone(&current.handle))
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, Option<Slot<C::Handle>>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<Slot<C::Handle>>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Connector> std::fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("ttl", &self.ttl)
            .field("connected", &self.read_slot().is_some())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        self.release();
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
