//! `erase` and `reset`: bulk deletion.

use std::io::Write;

use anyhow::{Context, Result};
use bc_core::Mode;
use bc_db::Tracker;

/// Deletes every event in the tracker's namespace. Requires `confirmed`.
pub fn erase<W: Write>(writer: &mut W, tracker: &Tracker, confirmed: bool) -> Result<()> {
    let namespace = tracker.namespace();
    if !confirmed {
        anyhow::bail!("refusing to erase {namespace} without --yes");
    }

    tracker
        .erase_all()
        .with_context(|| format!("failed to erase {namespace}"))?;
    writeln!(writer, "Erased all events in {namespace}")?;
    Ok(())
}

/// Clears the sandbox namespace. Refused while running in production mode.
pub fn reset<W: Write>(writer: &mut W, tracker: &Tracker) -> Result<()> {
    if tracker.namespace().mode == Mode::Production {
        anyhow::bail!("reset is only available in sandbox mode");
    }

    let removed = tracker
        .reset_sandbox()
        .context("failed to reset sandbox")?;
    writeln!(writer, "Removed {removed} sandbox event(s)")?;
    Ok(())
}
