//! Status command for showing the current activity.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use bc_db::Tracker;

use super::util::{format_event, format_timestamp};

pub fn run<W: Write>(
    writer: &mut W,
    tracker: &Tracker,
    database_path: &Path,
    now: i64,
    json: bool,
) -> Result<()> {
    let state = tracker
        .current_state(now)
        .context("failed to read current state")?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&state)?)?;
        return Ok(());
    }

    writeln!(writer, "Babylog status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Namespace: {}", tracker.namespace())?;

    match state.since {
        Some(since) => writeln!(
            writer,
            "State: {} since {}",
            state.activity.label(),
            format_timestamp(since)
        )?,
        None => writeln!(writer, "State: {}", state.activity.label())?,
    }
    match &state.last_event {
        Some(event) => writeln!(writer, "Last event: {}", format_event(event))?,
        None => writeln!(writer, "No events recorded.")?,
    }
    Ok(())
}
