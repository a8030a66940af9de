//! Command-line argument definitions.

use std::path::PathBuf;

use bc_core::{EventName, Period};
use clap::{Parser, Subcommand};

/// Infant activity ledger.
///
/// Records sleep, feeding, and diaper events and summarizes them over time.
/// Timestamps accept RFC 3339 ("2025-01-15T10:30:00Z"), relative times
/// ("20 minutes ago"), "now", or epoch milliseconds.
#[derive(Debug, Parser)]
#[command(name = "bc", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record an activity, toggling repeats and waking a sleeping baby.
    Update {
        /// Activity name (e.g. sleep, feedLeftStart, pee).
        action: EventName,

        /// When it happened (default: now).
        #[arg(long)]
        at: Option<String>,
    },

    /// Record an activity exactly as given, without toggling.
    Save {
        action: EventName,

        #[arg(long)]
        at: String,
    },

    /// List events in an inclusive time range.
    Search {
        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete the events recorded near a timestamp.
    Delete {
        #[arg(long)]
        at: String,
    },

    /// Move the event recorded near a timestamp to a new time.
    Move {
        #[arg(long)]
        at: String,

        #[arg(long)]
        to: String,
    },

    /// Change the activity of the event recorded near a timestamp.
    Rename {
        #[arg(long)]
        at: String,

        /// New activity name.
        name: EventName,
    },

    /// List every event.
    Dump {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete every event in the active namespace.
    Erase {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Show sleep, feeding, and diaper statistics.
    Stats {
        /// Named period ending now: hour, day, days2, week, thisweek.
        #[arg(long, conflicts_with_all = ["start", "end"])]
        period: Option<Period>,

        /// Window start (inclusive).
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Window end (exclusive).
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the current activity and the latest event.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Clear the sandbox namespace.
    Reset,

    /// Show connection pool statistics.
    PoolStats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
