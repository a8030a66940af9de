//! Toggle and auto-wake normalization of incoming actions.
//!
//! The ledger's most recent entry is the only state consulted: a repeated
//! `sleep` or feed start flips to its closing counterpart, and any
//! interrupting activity that arrives while the last entry is `sleep` gets a
//! synthetic `wake` planned just before it.

use crate::event::Event;
use crate::event_name::EventName;

/// Tunables for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeRules {
    /// How far before the requested event the synthetic `wake` is placed.
    /// Default: 1000 (1 second).
    pub auto_wake_offset_ms: i64,
}

impl Default for NormalizeRules {
    fn default() -> Self {
        Self {
            auto_wake_offset_ms: 1_000,
        }
    }
}

/// An event the ledger should append, before it has been given an ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedEvent {
    pub name: EventName,
    pub timestamp: i64,
    /// True for events inserted by normalization rather than requested.
    pub synthetic: bool,
}

/// Plans the events to append for `action` at `timestamp`, given the most
/// recently recorded event.
///
/// Returns the events in append order: an optional synthetic `wake`
/// followed by the (possibly rewritten) requested action.
pub fn normalize(
    last: Option<&Event>,
    action: EventName,
    timestamp: i64,
    rules: &NormalizeRules,
) -> Vec<PlannedEvent> {
    let action = toggle(last.map(|event| event.name), action);
    let mut planned = Vec::with_capacity(2);

    let asleep = last.filter(|event| event.name == EventName::Sleep);
    if let Some(sleep) = asleep.filter(|_| action.interrupts_sleep()) {
        planned.push(PlannedEvent {
            name: EventName::Wake,
            timestamp: auto_wake_timestamp(sleep.timestamp, timestamp, rules.auto_wake_offset_ms),
            synthetic: true,
        });
    }

    planned.push(PlannedEvent {
        name: action,
        timestamp,
        synthetic: false,
    });
    planned
}

/// Rewrites a consecutive repeat of a toggling action into its counterpart.
const fn toggle(last: Option<EventName>, action: EventName) -> EventName {
    match (last, action) {
        (Some(EventName::Sleep), EventName::Sleep) => EventName::Wake,
        (Some(EventName::FeedLeftStart), EventName::FeedLeftStart) => EventName::FeedLeftStop,
        (Some(EventName::FeedRightStart), EventName::FeedRightStart) => EventName::FeedRightStop,
        _ => action,
    }
}

/// Synthetic wake time: `offset` before the event, after the sleep when the
/// gap allows, and always strictly before the event.
fn auto_wake_timestamp(sleep_at: i64, event_at: i64, offset_ms: i64) -> i64 {
    let mut wake_at = event_at.saturating_sub(offset_ms.max(1));
    if wake_at <= sleep_at {
        wake_at = sleep_at.saturating_add(1);
    }
    wake_at.min(event_at - 1)
}
