//! `pool-stats`: connection manager observability.

use std::io::Write;

use anyhow::{Context, Result};
use bc_db::{PoolStats, PoolStatus, Tracker};

/// Touches the store so a handle exists, then reports the manager's state.
pub fn run<W: Write>(writer: &mut W, tracker: &Tracker, json: bool) -> Result<()> {
    let events = tracker.ledger().len().context("failed to reach store")?;
    let stats = tracker.pool_stats();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        writeln!(writer, "Events: {events}")?;
        write!(writer, "{}", format_pool_stats(&stats))?;
    }
    Ok(())
}

pub fn format_pool_stats(stats: &PoolStats) -> String {
    let status = match stats.status {
        PoolStatus::Connected => "connected",
        PoolStatus::Disconnected => "disconnected",
    };
    let seconds = |ms: Option<u64>| ms.map_or_else(|| "-".to_string(), |ms| format!("{}s", ms / 1_000));

    format!(
        "Status: {status}\n\
         Age: {}\n\
         TTL remaining: {} of {}s\n\
         Hits: {}  Misses: {}  Created: {}  Failures: {}\n\
         Connections: {} ({} idle)\n",
        seconds(stats.age_ms),
        seconds(stats.ttl_remaining_ms),
        stats.ttl_ms / 1_000,
        stats.hits,
        stats.misses,
        stats.created,
        stats.failures,
        stats.occupancy.connections,
        stats.occupancy.idle_connections,
    )
}
