//! `search` and `dump`: listing events.

use std::io::Write;

use anyhow::{Context, Result};
use bc_core::Event;
use bc_db::Tracker;

use super::util::format_event;

/// Lists events with `start <= timestamp <= end`.
pub fn search<W: Write>(
    writer: &mut W,
    tracker: &Tracker,
    start: i64,
    end: i64,
    json: bool,
) -> Result<()> {
    let events = tracker
        .search(start, end)
        .context("failed to search events")?;
    write_events(writer, &events, json)
}

/// Lists every event in the namespace.
pub fn dump<W: Write>(writer: &mut W, tracker: &Tracker, json: bool) -> Result<()> {
    let events = tracker.get_all().context("failed to read events")?;
    write_events(writer, &events, json)
}

fn write_events<W: Write>(writer: &mut W, events: &[Event], json: bool) -> Result<()> {
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(events)?)?;
        return Ok(());
    }

    if events.is_empty() {
        writeln!(writer, "No events.")?;
        return Ok(());
    }
    for event in events {
        writeln!(writer, "{}", format_event(event))?;
    }
    Ok(())
}
