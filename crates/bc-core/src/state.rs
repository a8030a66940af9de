//! Current activity derived from the most recent events.

use serde::Serialize;

use crate::event::Event;
use crate::event_name::EventName;

/// What the subject is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Activity {
    FeedingLeft,
    FeedingRight,
    Asleep,
    Awake,
    Unknown,
}

impl Activity {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FeedingLeft => "feeding (left)",
            Self::FeedingRight => "feeding (right)",
            Self::Asleep => "asleep",
            Self::Awake => "awake",
            Self::Unknown => "unknown",
        }
    }
}

/// Current activity plus the event that determined it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentState {
    pub activity: Activity,
    /// Timestamp of the event that started the current activity.
    pub since: Option<i64>,
    /// The most recent event overall.
    pub last_event: Option<Event>,
}

/// Derives the current activity from events sorted ascending.
///
/// An open feed (the latest feed event is a start) takes priority over
/// sleep; otherwise the latest `sleep`/`wake` decides.
pub fn current_state(events: &[Event]) -> CurrentState {
    let last_feed = events.iter().rev().find(|event| {
        event.name.feed_start_side().is_some() || event.name.feed_stop_side().is_some()
    });
    let last_sleep = events
        .iter()
        .rev()
        .find(|event| event.name.is_sleep_related());

    let (activity, since) = match (last_feed, last_sleep) {
        (Some(feed), _) if feed.name == EventName::FeedLeftStart => {
            (Activity::FeedingLeft, Some(feed.timestamp))
        }
        (Some(feed), _) if feed.name == EventName::FeedRightStart => {
            (Activity::FeedingRight, Some(feed.timestamp))
        }
        (_, Some(sleep)) if sleep.name == EventName::Sleep => {
            (Activity::Asleep, Some(sleep.timestamp))
        }
        (_, Some(wake)) => (Activity::Awake, Some(wake.timestamp)),
        (_, None) => (Activity::Unknown, None),
    };

    CurrentState {
        activity,
        since,
        last_event: events.last().cloned(),
    }
}
