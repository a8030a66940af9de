//! CLI subcommand implementations.
//!
//! Each command writes its output to a caller-supplied writer so tests can
//! capture it.

pub mod edit;
pub mod erase;
pub mod list;
pub mod pool;
pub mod record;
pub mod stats;
pub mod status;
pub mod util;
