//! Core domain logic for the infant activity ledger.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: timestamped activities and their canonical names
//! - Normalization: toggle and auto-wake rules applied before appending
//! - Stats: chronological replay of a window into durations and counts
//! - Periods and current state derived from recent events
//!
//! Nothing here performs I/O; storage lives in `bc-db`.

pub mod event;
pub mod event_name;
pub mod normalize;
pub mod period;
pub mod state;
pub mod stats;
pub mod types;

pub use event::Event;
pub use event_name::{EventName, Side, UnknownEventName};
pub use normalize::{NormalizeRules, PlannedEvent, normalize};
pub use period::{Period, UnknownPeriod};
pub use state::{Activity, CurrentState, current_state};
pub use stats::{StatsConfig, StatsResult, StatsWindow, compute_stats, needs_sleep_lookback};
pub use types::{EventId, Mode, Namespace, TenantId, ValidationError};
