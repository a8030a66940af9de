//! Stats aggregation by chronological replay.
//!
//! # Algorithm Summary
//!
//! 1. The caller reads the window `[start, end)` from the ledger.
//! 2. If the first sleep-related event in the window is a `wake`
//!    ([`needs_sleep_lookback`]), the caller looks back for the `sleep` that
//!    opened the session and passes its timestamp as `sleeping_since`.
//! 3. Events are replayed in order with three independent states: sleeping,
//!    feeding left, feeding right. Feed starts and diaper changes close an
//!    ongoing sleep before their own effect is applied.
//! 4. Sessions still open at `end` contribute their elapsed time but are
//!    never counted as completed.
//!
//! Durations are always clipped to the window start. Only sleep sessions
//! that began inside the window count toward the session count and average.

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::event_name::{EventName, Side};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// A half-open time window `[start, end)` in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub start: i64,
    pub end: i64,
}

impl StatsWindow {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub const fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    /// Inclusive upper bound for ledger range reads, or `None` for an empty
    /// window.
    pub const fn last_included(&self) -> Option<i64> {
        if self.end > self.start {
            Some(self.end - 1)
        } else {
            None
        }
    }
}

/// Configuration for stats computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsConfig {
    /// How far before the window to search for the `sleep` that opened a
    /// session already in progress.
    /// Default: 604800000 (7 days).
    pub lookback_ms: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            lookback_ms: 7 * DAY_MS,
        }
    }
}

/// Aggregate statistics for a window. Derived, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResult {
    pub sleep_total_ms: i64,
    pub sleep_session_count: u32,
    pub avg_sleep_session_ms: i64,
    pub feed_left_count: u32,
    pub feed_left_total_ms: i64,
    pub feed_right_count: u32,
    pub feed_right_total_ms: i64,
    pub pee_count: u32,
    pub poop_count: u32,
    pub window_start: i64,
    pub window_end: i64,
}

/// Returns true when the first sleep-related event is a `wake`, meaning a
/// sleep session was already in progress when the window opened.
pub fn needs_sleep_lookback(events: &[Event]) -> bool {
    events
        .iter()
        .find(|event| event.name.is_sleep_related())
        .is_some_and(|event| event.name == EventName::Wake)
}

/// Replays `events` over `window` and returns the aggregate statistics.
///
/// `events` must be sorted by timestamp ascending; events outside the window
/// are ignored. `sleeping_since` is the start of a sleep session that began
/// before the window and is still open at its start.
pub fn compute_stats(
    events: &[Event],
    window: StatsWindow,
    sleeping_since: Option<i64>,
) -> StatsResult {
    let mut replay = Replay::new(window, sleeping_since);
    for event in events.iter().filter(|event| window.contains(event.timestamp)) {
        replay.apply(event);
    }
    replay.finish()
}

#[derive(Debug)]
struct Replay {
    window: StatsWindow,
    sleep_start: Option<i64>,
    feed_left_start: Option<i64>,
    feed_right_start: Option<i64>,
    completed_sleep_ms: i64,
    result: StatsResult,
}

impl Replay {
    fn new(window: StatsWindow, sleeping_since: Option<i64>) -> Self {
        Self {
            window,
            sleep_start: sleeping_since,
            feed_left_start: None,
            feed_right_start: None,
            completed_sleep_ms: 0,
            result: StatsResult {
                window_start: window.start,
                window_end: window.end,
                ..StatsResult::default()
            },
        }
    }

    /// Elapsed time from `start` to `end`, not counting time before the window.
    fn clipped(&self, start: i64, end: i64) -> i64 {
        (end - start.max(self.window.start)).max(0)
    }

    fn feed_slot(&mut self, side: Side) -> &mut Option<i64> {
        match side {
            Side::Left => &mut self.feed_left_start,
            Side::Right => &mut self.feed_right_start,
        }
    }

    fn close_sleep(&mut self, at: i64) {
        let Some(start) = self.sleep_start.take() else {
            return;
        };
        let duration = self.clipped(start, at);
        self.result.sleep_total_ms += duration;
        if start >= self.window.start {
            self.result.sleep_session_count += 1;
            self.completed_sleep_ms += duration;
        }
    }

    fn apply(&mut self, event: &Event) {
        let at = event.timestamp;

        if event.name.interrupts_sleep() {
            self.close_sleep(at);
        }

        match event.name {
            EventName::Sleep => {
                if self.sleep_start.is_none() {
                    self.sleep_start = Some(at);
                }
            }
            EventName::Wake => self.close_sleep(at),
            EventName::FeedLeftStart => self.start_feed(Side::Left, at),
            EventName::FeedRightStart => self.start_feed(Side::Right, at),
            EventName::FeedLeftStop => self.stop_feed(Side::Left, at),
            EventName::FeedRightStop => self.stop_feed(Side::Right, at),
            EventName::Pee => self.result.pee_count += 1,
            EventName::Poop => self.result.poop_count += 1,
        }
    }

    fn start_feed(&mut self, side: Side, at: i64) {
        let slot = self.feed_slot(side);
        if slot.is_some() {
            return;
        }
        *slot = Some(at);
        match side {
            Side::Left => self.result.feed_left_count += 1,
            Side::Right => self.result.feed_right_count += 1,
        }
    }

    fn stop_feed(&mut self, side: Side, at: i64) {
        if let Some(start) = self.feed_slot(side).take() {
            self.add_feed_time(side, start, at);
        }
    }

    fn add_feed_time(&mut self, side: Side, start: i64, end: i64) {
        let duration = self.clipped(start, end);
        match side {
            Side::Left => self.result.feed_left_total_ms += duration,
            Side::Right => self.result.feed_right_total_ms += duration,
        }
    }

    fn finish(mut self) -> StatsResult {
        let end = self.window.end;

        // Open sessions run to the window end but never count as completed.
        if let Some(start) = self.sleep_start.take() {
            self.result.sleep_total_ms += self.clipped(start, end);
        }
        for side in [Side::Left, Side::Right] {
            if let Some(start) = self.feed_slot(side).take() {
                self.add_feed_time(side, start, end);
            }
        }

        if self.result.sleep_session_count > 0 {
            self.result.avg_sleep_session_ms =
                self.completed_sleep_ms / i64::from(self.result.sleep_session_count);
        }
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventId;

    const BASE: i64 = 1_000_000_000_000;
    const MINUTE: i64 = 60_000;

    fn at(minutes: i64) -> i64 {
        BASE + minutes * MINUTE
    }

    fn event(name: EventName, minutes: i64) -> Event {
        Event::new(EventId::new(format!("evt-{minutes}")).unwrap(), at(minutes), name)
    }

    fn window(start_min: i64, end_min: i64) -> StatsWindow {
        StatsWindow::new(at(start_min), at(end_min))
    }

    #[test]
    fn test_full_day_replay() {
        let events = vec![
            event(EventName::Sleep, 0),
            event(EventName::Wake, 30),
            event(EventName::FeedLeftStart, 60),
            event(EventName::FeedLeftStop, 75),
            event(EventName::Pee, 90),
            event(EventName::FeedRightStart, 120),
            event(EventName::FeedRightStop, 140),
            event(EventName::Sleep, 150),
            event(EventName::Poop, 180),
        ];

        let stats = compute_stats(&events, window(0, 200), None);

        assert_eq!(stats.sleep_total_ms, 60 * MINUTE);
        assert_eq!(stats.sleep_session_count, 2);
        assert_eq!(stats.avg_sleep_session_ms, 30 * MINUTE);
        assert_eq!(stats.feed_left_count, 1);
        assert_eq!(stats.feed_right_count, 1);
        assert_eq!(stats.feed_left_total_ms, 15 * MINUTE);
        assert_eq!(stats.feed_right_total_ms, 20 * MINUTE);
        assert_eq!(stats.pee_count, 1);
        assert_eq!(stats.poop_count, 1);
        assert_eq!(stats.window_start, at(0));
        assert_eq!(stats.window_end, at(200));
    }

    #[test]
    fn test_empty_window_is_all_zero() {
        let stats = compute_stats(&[], StatsWindow::new(0, 1_000_000), None);
        assert_eq!(
            stats,
            StatsResult {
                window_start: 0,
                window_end: 1_000_000,
                ..StatsResult::default()
            }
        );
    }

    #[test]
    fn test_ongoing_sleep_at_window_end() {
        let events = vec![event(EventName::Sleep, 0)];
        let stats = compute_stats(&events, window(0, 120), None);

        assert_eq!(stats.sleep_total_ms, 120 * MINUTE);
        assert_eq!(stats.sleep_session_count, 0);
        assert_eq!(stats.avg_sleep_session_ms, 0);
    }

    #[test]
    fn test_ongoing_feeding_at_window_end() {
        let events = vec![event(EventName::FeedLeftStart, 0)];
        let stats = compute_stats(&events, window(0, 60), None);

        assert_eq!(stats.feed_left_total_ms, 60 * MINUTE);
        assert_eq!(stats.feed_left_count, 1);
    }

    #[test]
    fn test_feeding_interrupts_sleep() {
        let events = vec![
            event(EventName::Sleep, 0),
            event(EventName::FeedLeftStart, 30),
            event(EventName::FeedLeftStop, 45),
        ];
        let stats = compute_stats(&events, window(0, 60), None);

        assert_eq!(stats.sleep_total_ms, 30 * MINUTE);
        assert_eq!(stats.sleep_session_count, 1);
        assert_eq!(stats.feed_left_count, 1);
        assert_eq!(stats.feed_left_total_ms, 15 * MINUTE);
    }

    #[test]
    fn test_repeated_interruptions_reopen_and_close_sleep() {
        let events = vec![
            event(EventName::Sleep, 0),
            event(EventName::Pee, 10),
            event(EventName::Sleep, 20),
            event(EventName::Poop, 50),
            event(EventName::Sleep, 60),
            event(EventName::FeedRightStart, 100),
        ];
        let stats = compute_stats(&events, window(0, 120), None);

        assert_eq!(stats.sleep_total_ms, (10 + 30 + 40) * MINUTE);
        assert_eq!(stats.sleep_session_count, 3);
        assert_eq!(stats.avg_sleep_session_ms, (80 * MINUTE) / 3);
        assert_eq!(stats.pee_count, 1);
        assert_eq!(stats.poop_count, 1);
        assert_eq!(stats.feed_right_total_ms, 20 * MINUTE);
    }

    #[test]
    fn test_session_started_before_window_is_clipped_and_not_counted() {
        let events = vec![event(EventName::Sleep, 0), event(EventName::Wake, 30)];
        let in_window: Vec<_> = events
            .iter()
            .filter(|e| window(10, 40).contains(e.timestamp))
            .cloned()
            .collect();

        assert!(needs_sleep_lookback(&in_window));
        let stats = compute_stats(&in_window, window(10, 40), Some(at(0)));

        assert_eq!(stats.sleep_total_ms, 20 * MINUTE);
        assert_eq!(stats.sleep_session_count, 0);
        assert_eq!(stats.avg_sleep_session_ms, 0);
    }

    #[test]
    fn test_session_spanning_whole_window_contributes_window_length() {
        let stats = compute_stats(&[], window(60, 120), Some(at(0)));

        assert_eq!(stats.sleep_total_ms, 60 * MINUTE);
        assert_eq!(stats.sleep_session_count, 0);
        assert_eq!(stats.avg_sleep_session_ms, 0);
    }

    #[test]
    fn test_prior_session_excluded_from_average() {
        let events = vec![
            event(EventName::Wake, 70),
            event(EventName::Sleep, 80),
            event(EventName::Wake, 100),
        ];
        let stats = compute_stats(&events, window(60, 120), Some(at(0)));

        assert_eq!(stats.sleep_total_ms, 30 * MINUTE);
        assert_eq!(stats.sleep_session_count, 1);
        assert_eq!(stats.avg_sleep_session_ms, 20 * MINUTE);
    }

    #[test]
    fn test_repeated_starts_count_once() {
        let events = vec![
            event(EventName::FeedLeftStart, 0),
            event(EventName::FeedRightStart, 5),
            event(EventName::FeedLeftStart, 10),
            event(EventName::FeedLeftStop, 20),
            event(EventName::FeedRightStop, 25),
        ];
        let stats = compute_stats(&events, window(0, 60), None);

        assert_eq!(stats.feed_left_count, 1);
        assert_eq!(stats.feed_left_total_ms, 20 * MINUTE);
        assert_eq!(stats.feed_right_count, 1);
        assert_eq!(stats.feed_right_total_ms, 20 * MINUTE);
    }

    #[test]
    fn test_feed_stop_does_not_interrupt_sleep() {
        let events = vec![
            event(EventName::Sleep, 0),
            event(EventName::FeedLeftStop, 10),
            event(EventName::Wake, 40),
        ];
        let stats = compute_stats(&events, window(0, 60), None);

        assert_eq!(stats.sleep_total_ms, 40 * MINUTE);
        assert_eq!(stats.sleep_session_count, 1);
        assert_eq!(stats.feed_left_total_ms, 0);
    }

    #[test]
    fn test_events_outside_window_are_ignored() {
        let events = vec![
            event(EventName::Pee, -5),
            event(EventName::Pee, 10),
            event(EventName::Pee, 60),
        ];
        let stats = compute_stats(&events, window(0, 60), None);
        assert_eq!(stats.pee_count, 1);
    }

    #[test]
    fn test_lookback_only_when_first_sleep_event_is_wake() {
        assert!(!needs_sleep_lookback(&[]));
        assert!(!needs_sleep_lookback(&[
            event(EventName::Pee, 0),
            event(EventName::Sleep, 5),
            event(EventName::Wake, 10),
        ]));
        assert!(needs_sleep_lookback(&[
            event(EventName::FeedLeftStart, 0),
            event(EventName::Wake, 10),
            event(EventName::Sleep, 20),
        ]));
    }

    #[test]
    fn test_stats_result_serializes_camel_case() {
        let json = serde_json::to_value(StatsResult::default()).unwrap();
        for key in [
            "sleepTotalMs",
            "sleepSessionCount",
            "avgSleepSessionMs",
            "feedLeftCount",
            "feedLeftTotalMs",
            "feedRightCount",
            "feedRightTotalMs",
            "peeCount",
            "poopCount",
            "windowStart",
            "windowEnd",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_window_last_included() {
        assert_eq!(StatsWindow::new(10, 20).last_included(), Some(19));
        assert_eq!(StatsWindow::new(10, 10).last_included(), None);
    }
}
