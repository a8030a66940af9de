//! `update` and `save`: recording new events.

use std::io::Write;

use anyhow::{Context, Result};
use bc_core::EventName;
use bc_db::Tracker;

use super::util::format_timestamp;

/// Records `action` with toggle and auto-wake normalization.
pub fn update<W: Write>(
    writer: &mut W,
    tracker: &Tracker,
    action: EventName,
    at: i64,
) -> Result<()> {
    let stored = tracker
        .record(action, at)
        .context("failed to record event")?;

    if stored.is_empty() {
        writeln!(writer, "Nothing recorded.")?;
        return Ok(());
    }
    for event in &stored {
        let note = if event.timestamp == at { "" } else { " (automatic)" };
        writeln!(
            writer,
            "Recorded {} at {}{note}",
            event.name,
            format_timestamp(event.timestamp)
        )?;
    }
    Ok(())
}

/// Records `action` verbatim.
pub fn save<W: Write>(writer: &mut W, tracker: &Tracker, action: EventName, at: i64) -> Result<()> {
    let stored = tracker.save(at, action).context("failed to save event")?;
    if stored {
        writeln!(writer, "Saved {action} at {}", format_timestamp(at))?;
    } else {
        writeln!(writer, "Event already recorded.")?;
    }
    Ok(())
}
