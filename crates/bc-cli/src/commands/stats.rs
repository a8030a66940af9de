//! `stats`: sleep, feeding, and diaper statistics.

use std::io::Write;

use anyhow::{Context, Result};
use bc_core::{Period, StatsResult};
use bc_db::Tracker;
use chrono::{DateTime, TimeZone};

use super::util::{format_duration, format_timestamp};

/// Stats for a named period ending at `now`.
pub fn run_period<W: Write, Tz: TimeZone>(
    writer: &mut W,
    tracker: &Tracker,
    period: Period,
    now: &DateTime<Tz>,
    json: bool,
) -> Result<()> {
    let stats = tracker
        .stats_for_period(period, now)
        .with_context(|| format!("failed to compute stats for {period}"))?;
    write_stats(writer, &stats, json)
}

/// Stats over `[start, end)`.
pub fn run_range<W: Write>(
    writer: &mut W,
    tracker: &Tracker,
    start: i64,
    end: i64,
    json: bool,
) -> Result<()> {
    let stats = tracker
        .compute_stats(start, end)
        .context("failed to compute stats")?;
    write_stats(writer, &stats, json)
}

fn write_stats<W: Write>(writer: &mut W, stats: &StatsResult, json: bool) -> Result<()> {
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(stats)?)?;
    } else {
        write!(writer, "{}", format_stats(stats))?;
    }
    Ok(())
}

pub fn format_stats(stats: &StatsResult) -> String {
    format!(
        "Stats from {} to {}\n\
         Sleep:       {} in {} session(s), avg {}\n\
         Feed left:   {} feed(s), {}\n\
         Feed right:  {} feed(s), {}\n\
         Pee:         {}\n\
         Poop:        {}\n",
        format_timestamp(stats.window_start),
        format_timestamp(stats.window_end),
        format_duration(stats.sleep_total_ms),
        stats.sleep_session_count,
        format_duration(stats.avg_sleep_session_ms),
        stats.feed_left_count,
        format_duration(stats.feed_left_total_ms),
        stats.feed_right_count,
        format_duration(stats.feed_right_total_ms),
        stats.pee_count,
        stats.poop_count,
    )
}
