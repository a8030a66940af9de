//! `delete`, `move`, and `rename`: editing events addressed by timestamp.
//!
//! An event is addressed by any timestamp within the configured tolerance
//! of its own.

use std::io::Write;

use anyhow::{Context, Result};
use bc_core::{Event, EventName};
use bc_db::Tracker;

use super::util::format_timestamp;

pub fn delete<W: Write>(writer: &mut W, tracker: &Tracker, at: i64) -> Result<()> {
    let removed = tracker.delete(at).context("failed to delete events")?;
    if removed {
        writeln!(writer, "Deleted events near {}", format_timestamp(at))?;
    } else {
        writeln!(writer, "No event found near {}", format_timestamp(at))?;
    }
    Ok(())
}

/// Moves the event closest to `at` to `to`.
pub fn move_event<W: Write>(writer: &mut W, tracker: &Tracker, at: i64, to: i64) -> Result<()> {
    let Some(event) = closest_event(tracker, at)? else {
        writeln!(writer, "No event found near {}", format_timestamp(at))?;
        return Ok(());
    };

    tracker
        .change_timestamp(&event, to)
        .with_context(|| format!("failed to move {} event", event.name))?;
    writeln!(
        writer,
        "Moved {} from {} to {}",
        event.name,
        format_timestamp(event.timestamp),
        format_timestamp(to)
    )?;
    Ok(())
}

pub fn rename<W: Write>(writer: &mut W, tracker: &Tracker, at: i64, name: EventName) -> Result<()> {
    let renamed = tracker
        .update_event_name(at, name)
        .context("failed to rename event")?;
    if renamed {
        writeln!(writer, "Renamed event at {} to {name}", format_timestamp(at))?;
    } else {
        writeln!(writer, "No event found near {}", format_timestamp(at))?;
    }
    Ok(())
}

fn closest_event(tracker: &Tracker, at: i64) -> Result<Option<Event>> {
    let tolerance = tracker.config().tolerance_ms;
    let candidates = tracker
        .search(at.saturating_sub(tolerance), at.saturating_add(tolerance))
        .context("failed to look up event")?;
    Ok(candidates
        .into_iter()
        .min_by_key(|event| event.timestamp.abs_diff(at)))
}
