//! Ordered event ledger over the `ledger` table.
//!
//! Each [`Ledger`] is bound to one namespace. Members are JSON-encoded
//! [`Event`]s and are unique within the namespace; the score is the event
//! timestamp. Ties keep insertion order.

use std::sync::Arc;

use bc_core::{Event, EventName, Namespace};
use rusqlite::{Connection, params};
use tracing::{debug, warn};

use crate::DbError;
use crate::connector::{PooledConnection, StoreManager};

/// Namespace-scoped view of the shared store.
#[derive(Debug, Clone)]
pub struct Ledger {
    store: Arc<StoreManager>,
    namespace: Namespace,
    key: String,
}

impl Ledger {
    pub fn new(store: Arc<StoreManager>, namespace: Namespace) -> Self {
        let key = namespace.key();
        Self {
            store,
            namespace,
            key,
        }
    }

    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Appends an event. Returns `false` if the identical member already
    /// exists in this namespace.
    pub fn append(&self, event: &Event) -> Result<bool, DbError> {
        let member = serde_json::to_string(event)?;
        let conn = self.conn()?;
        insert_member(&conn, &self.key, event.timestamp, &member)
    }

    /// Events with `start <= timestamp <= end`, ascending. Malformed members
    /// are skipped.
    pub fn query_range(&self, start: i64, end: i64) -> Result<Vec<Event>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "
            SELECT score, member FROM ledger
            WHERE namespace = ?1 AND score BETWEEN ?2 AND ?3
            ORDER BY score ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map(params![self.key, start, end], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (score, member) = row?;
            if let Some(event) = self.decode(score, &member) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Every event in the namespace, ascending.
    pub fn all(&self) -> Result<Vec<Event>, DbError> {
        self.query_range(i64::MIN, i64::MAX)
    }

    /// The event with the highest score, skipping malformed members.
    pub fn last_event(&self) -> Result<Option<Event>, DbError> {
        self.latest_matching(i64::MIN, i64::MAX, |_| true)
    }

    /// The most recent event named `name` with
    /// `before - lookback_ms <= timestamp < before`.
    pub fn last_event_before(
        &self,
        before: i64,
        lookback_ms: i64,
        name: EventName,
    ) -> Result<Option<Event>, DbError> {
        let Some(end) = before.checked_sub(1) else {
            return Ok(None);
        };
        let start = before.saturating_sub(lookback_ms.max(0));
        self.latest_matching(start, end, |event| event.name == name)
    }

    /// Removes every member whose score lies within `tolerance_ms` of
    /// `timestamp`. Returns the number removed.
    pub fn delete_near(&self, timestamp: i64, tolerance_ms: i64) -> Result<usize, DbError> {
        let (start, end) = proximity(timestamp, tolerance_ms)?;
        let conn = self.conn()?;
        let removed = delete_range(&conn, &self.key, start, end)?;
        debug!(namespace = %self.key, timestamp, removed, "deleted events");
        Ok(removed)
    }

    /// Moves `event` to `new_timestamp`: removes members near the event's
    /// current timestamp, then appends the moved copy.
    ///
    /// The two steps are not atomic. If the append fails after something was
    /// removed, the error is [`DbError::PartialReplace`].
    pub fn replace(
        &self,
        event: &Event,
        new_timestamp: i64,
        tolerance_ms: i64,
    ) -> Result<bool, DbError> {
        let (start, end) = proximity(event.timestamp, tolerance_ms)?;
        let moved = event.moved_to(new_timestamp);
        let member = serde_json::to_string(&moved)?;

        let conn = self.conn()?;
        let removed = delete_range(&conn, &self.key, start, end)?;
        match insert_member(&conn, &self.key, new_timestamp, &member) {
            Ok(inserted) => {
                debug!(
                    namespace = %self.key,
                    from = event.timestamp,
                    to = new_timestamp,
                    removed,
                    "moved event"
                );
                Ok(inserted)
            }
            Err(source) if removed > 0 => {
                warn!(event_id = %event.id, removed, error = %source, "move left event deleted");
                Err(DbError::PartialReplace {
                    event_id: event.id.to_string(),
                    removed,
                    source: Box::new(source),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Renames the event closest to `timestamp` within `tolerance_ms`.
    /// Returns `false` when no event is in range.
    pub fn rename_near(
        &self,
        timestamp: i64,
        tolerance_ms: i64,
        name: EventName,
    ) -> Result<bool, DbError> {
        let (start, end) = proximity(timestamp, tolerance_ms)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let closest = {
            let mut stmt = tx.prepare(
                "
                SELECT score, member FROM ledger
                WHERE namespace = ?1 AND score BETWEEN ?2 AND ?3
                ORDER BY abs(score - ?4) ASC, rowid ASC
                ",
            )?;
            let rows = stmt.query_map(params![self.key, start, end, timestamp], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut closest = None;
            for row in rows {
                let (score, member) = row?;
                if let Some(event) = self.decode(score, &member) {
                    closest = Some((member, event));
                    break;
                }
            }
            closest
        };

        let Some((old_member, mut event)) = closest else {
            return Ok(false);
        };
        event.name = name;
        let new_member = serde_json::to_string(&event)?;
        tx.execute(
            "UPDATE ledger SET member = ?1 WHERE namespace = ?2 AND member = ?3",
            params![new_member, self.key, old_member],
        )?;
        tx.commit()?;
        debug!(namespace = %self.key, event_id = %event.id, name = %name, "renamed event");
        Ok(true)
    }

    /// Drops the whole namespace. Returns the number of members removed.
    pub fn erase(&self) -> Result<usize, DbError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM ledger WHERE namespace = ?1",
            params![self.key],
        )?;
        debug!(namespace = %self.key, removed, "erased namespace");
        Ok(removed)
    }

    /// Number of members, including malformed ones.
    pub fn len(&self) -> Result<usize, DbError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM ledger WHERE namespace = ?1",
            params![self.key],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn is_empty(&self) -> Result<bool, DbError> {
        Ok(self.len()? == 0)
    }

    /// Checks out a connection. A checkout timeout means the store cannot be
    /// reached and is reported as [`DbError::Unavailable`].
    fn conn(&self) -> Result<PooledConnection, DbError> {
        let pool = self.store.acquire()?;
        pool.get().map_err(|err| {
            warn!(namespace = %self.key, error = %err, "connection checkout failed");
            DbError::Unavailable {
                reason: err.to_string(),
            }
        })
    }

    fn latest_matching(
        &self,
        start: i64,
        end: i64,
        matches: impl Fn(&Event) -> bool,
    ) -> Result<Option<Event>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "
            SELECT score, member FROM ledger
            WHERE namespace = ?1 AND score BETWEEN ?2 AND ?3
            ORDER BY score DESC, rowid DESC
            ",
        )?;
        let rows = stmt.query_map(params![self.key, start, end], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (score, member) = row?;
            if let Some(event) = self.decode(score, &member).filter(|event| matches(event)) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn decode(&self, score: i64, member: &str) -> Option<Event> {
        match serde_json::from_str::<Event>(member) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(namespace = %self.key, score, error = %err, "skipping malformed ledger member");
                None
            }
        }
    }
}

fn proximity(timestamp: i64, tolerance_ms: i64) -> Result<(i64, i64), DbError> {
    if tolerance_ms < 0 {
        return Err(DbError::InvalidTolerance(tolerance_ms));
    }
    Ok((
        timestamp.saturating_sub(tolerance_ms),
        timestamp.saturating_add(tolerance_ms),
    ))
}

fn insert_member(
    conn: &Connection,
    key: &str,
    score: i64,
    member: &str,
) -> Result<bool, DbError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO ledger (namespace, score, member) VALUES (?1, ?2, ?3)",
        params![key, score, member],
    )?;
    Ok(inserted > 0)
}

fn delete_range(conn: &Connection, key: &str, start: i64, end: i64) -> Result<usize, DbError> {
    Ok(conn.execute(
        "DELETE FROM ledger WHERE namespace = ?1 AND score BETWEEN ?2 AND ?3",
        params![key, start, end],
    )?)
}

/// Test helper: raw member insertion, bypassing event encoding.
#[cfg(test)]
pub(crate) fn insert_raw(ledger: &Ledger, score: i64, member: &str) -> Result<bool, DbError> {
    let conn = ledger.conn()?;
    insert_member(&conn, &ledger.key, score, member)
}

#[cfg(test)]
pub(crate) fn member_exists(ledger: &Ledger, member: &str) -> Result<bool, DbError> {
    use rusqlite::OptionalExtension;

    let conn = ledger.conn()?;
    Ok(conn
        .query_row(
            "SELECT 1 FROM ledger WHERE namespace = ?1 AND member = ?2",
            params![ledger.key, member],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}
