//! Tracker facade: the operations the CLI exposes, on top of one namespace.

use std::sync::Arc;

use bc_core::{
    CurrentState, Event, EventId, EventName, Mode, Namespace, NormalizeRules, Period,
    StatsConfig, StatsResult, StatsWindow, compute_stats, current_state, needs_sleep_lookback,
    normalize,
};
use chrono::{DateTime, TimeZone};
use tracing::{debug, info};
use uuid::Uuid;

use crate::DbError;
use crate::connector::StoreManager;
use crate::ledger::Ledger;
use crate::pool::PoolStats;

/// Tunables shared by tracker operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Identity window for timestamp-addressed edits (default: 100).
    pub tolerance_ms: i64,
    pub rules: NormalizeRules,
    pub stats: StatsConfig,
    /// Tag stamped on every event this tracker records.
    pub author: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tolerance_ms: 100,
            rules: NormalizeRules::default(),
            stats: StatsConfig::default(),
            author: None,
        }
    }
}

/// Records and queries events for one tenant in one mode.
#[derive(Debug, Clone)]
pub struct Tracker {
    store: Arc<StoreManager>,
    ledger: Ledger,
    config: TrackerConfig,
}

impl Tracker {
    pub fn new(store: Arc<StoreManager>, namespace: Namespace, config: TrackerConfig) -> Self {
        let ledger = Ledger::new(Arc::clone(&store), namespace);
        Self {
            store,
            ledger,
            config,
        }
    }

    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub const fn namespace(&self) -> &Namespace {
        self.ledger.namespace()
    }

    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Records `action` at `timestamp` after toggle and auto-wake
    /// normalization. Returns `true` when anything was stored.
    pub fn update(&self, action: EventName, timestamp: i64) -> Result<bool, DbError> {
        Ok(!self.record(action, timestamp)?.is_empty())
    }

    /// [`update`](Self::update), returning the events that were stored in
    /// append order. A synthetic `wake` comes first when one was inserted.
    pub fn record(&self, action: EventName, timestamp: i64) -> Result<Vec<Event>, DbError> {
        let last = self.ledger.last_event()?;
        let planned = normalize(last.as_ref(), action, timestamp, &self.config.rules);

        let mut stored = Vec::with_capacity(planned.len());
        for step in planned {
            let event = self.stamp(step.name, step.timestamp)?;
            if !self.ledger.append(&event)? {
                continue;
            }
            if step.synthetic {
                info!(timestamp = step.timestamp, "inserted automatic wake");
            }
            debug!(name = %event.name, timestamp = event.timestamp, "recorded event");
            stored.push(event);
        }
        Ok(stored)
    }

    /// Appends `action` at `timestamp` verbatim, without normalization.
    pub fn save(&self, timestamp: i64, action: EventName) -> Result<bool, DbError> {
        let event = self.stamp(action, timestamp)?;
        self.ledger.append(&event)
    }

    pub fn search(&self, start: i64, end: i64) -> Result<Vec<Event>, DbError> {
        self.ledger.query_range(start, end)
    }

    /// Removes the events within the tolerance of `timestamp`. Returns
    /// `true` when at least one was removed.
    pub fn delete(&self, timestamp: i64) -> Result<bool, DbError> {
        Ok(self.ledger.delete_near(timestamp, self.config.tolerance_ms)? > 0)
    }

    /// Moves `event` to `new_timestamp`, keeping its id, name, and author.
    pub fn change_timestamp(&self, event: &Event, new_timestamp: i64) -> Result<bool, DbError> {
        self.ledger
            .replace(event, new_timestamp, self.config.tolerance_ms)
    }

    /// Renames the event closest to `timestamp`. Returns `false` when no
    /// event is within the tolerance.
    pub fn update_event_name(&self, timestamp: i64, new_name: EventName) -> Result<bool, DbError> {
        self.ledger
            .rename_near(timestamp, self.config.tolerance_ms, new_name)
    }

    pub fn get_all(&self) -> Result<Vec<Event>, DbError> {
        self.ledger.all()
    }

    pub fn erase_all(&self) -> Result<bool, DbError> {
        let removed = self.ledger.erase()?;
        info!(namespace = %self.namespace(), removed, "erased all events");
        Ok(true)
    }

    /// Statistics over `[start, end)`.
    pub fn compute_stats(&self, start: i64, end: i64) -> Result<StatsResult, DbError> {
        let window = StatsWindow::new(start, end);
        let Some(last_included) = window.last_included() else {
            return Ok(compute_stats(&[], window, None));
        };

        let events = self.ledger.query_range(window.start, last_included)?;
        let sleeping_since = if needs_sleep_lookback(&events) {
            self.ledger
                .last_event_before(window.start, self.config.stats.lookback_ms, EventName::Sleep)?
                .map(|sleep| sleep.timestamp)
        } else {
            None
        };
        debug!(
            start,
            end,
            events = events.len(),
            lookback = sleeping_since.is_some(),
            "computing stats"
        );
        Ok(compute_stats(&events, window, sleeping_since))
    }

    /// Statistics for a named period ending at `now`.
    pub fn stats_for_period<Tz: TimeZone>(
        &self,
        period: Period,
        now: &DateTime<Tz>,
    ) -> Result<StatsResult, DbError> {
        let window = period.window_at(now);
        self.compute_stats(window.start, window.end)
    }

    /// Current activity, derived from the events of the last lookback
    /// window before `now`.
    pub fn current_state(&self, now: i64) -> Result<CurrentState, DbError> {
        let since = now.saturating_sub(self.config.stats.lookback_ms);
        let events = self.ledger.query_range(since, i64::MAX)?;
        Ok(current_state(&events))
    }

    /// Erases this tenant's sandbox namespace, whatever mode the tracker
    /// is bound to. Returns the number of events removed.
    pub fn reset_sandbox(&self) -> Result<usize, DbError> {
        let sandbox = Ledger::new(
            Arc::clone(&self.store),
            self.namespace().with_mode(Mode::Sandbox),
        );
        let removed = sandbox.erase()?;
        info!(namespace = %sandbox.namespace(), removed, "reset sandbox");
        Ok(removed)
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.store.stats()
    }

    fn stamp(&self, name: EventName, timestamp: i64) -> Result<Event, DbError> {
        let id = EventId::new(Uuid::new_v4().to_string())?;
        Ok(Event::new(id, timestamp, name).with_author(self.config.author.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use bc_core::TenantId;
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::connector::{StoreConfig, open_store};
    use crate::ledger::insert_raw;

    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;
    const T0: i64 = 1_736_935_200_000;

    fn tracker_with(mode: Mode, config: TrackerConfig) -> (TempDir, Tracker) {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(
            &dir.path().join("ledger.db"),
            StoreConfig::default(),
            Duration::from_secs(300),
        );
        let namespace = Namespace::new(TenantId::new("alice").unwrap(), mode);
        (dir, Tracker::new(store, namespace, config))
    }

    fn tracker() -> (TempDir, Tracker) {
        tracker_with(Mode::Sandbox, TrackerConfig::default())
    }

    fn names(tracker: &Tracker) -> Vec<EventName> {
        tracker.get_all().unwrap().iter().map(|e| e.name).collect()
    }

    #[test]
    fn repeated_sleep_toggles() {
        let (_dir, tracker) = tracker();
        tracker.update(EventName::Sleep, T0).unwrap();
        tracker.update(EventName::Sleep, T0 + HOUR).unwrap();
        assert_eq!(names(&tracker), vec![EventName::Sleep, EventName::Wake]);

        tracker.update(EventName::Sleep, T0 + 2 * HOUR).unwrap();
        assert_eq!(
            names(&tracker),
            vec![EventName::Sleep, EventName::Wake, EventName::Sleep]
        );
    }

    #[test]
    fn feed_sides_toggle_independently() {
        let (_both_dir, both) = tracker();
        both.update(EventName::FeedLeftStart, T0).unwrap();
        both.update(EventName::FeedRightStart, T0 + MINUTE).unwrap();
        assert_eq!(
            names(&both),
            vec![EventName::FeedLeftStart, EventName::FeedRightStart]
        );

        let (_left_dir, left) = tracker();
        left.update(EventName::FeedLeftStart, T0).unwrap();
        left.update(EventName::FeedLeftStart, T0 + MINUTE).unwrap();
        assert_eq!(
            names(&left),
            vec![EventName::FeedLeftStart, EventName::FeedLeftStop]
        );
    }

    #[test]
    fn diaper_during_sleep_inserts_wake_and_completes_session() {
        let (_dir, tracker) = tracker();
        let t1 = T0 + HOUR;
        tracker.update(EventName::Sleep, T0).unwrap();
        assert!(tracker.update(EventName::Pee, t1).unwrap());

        let events = tracker.get_all().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].name, EventName::Wake);
        assert_eq!(events[2].name, EventName::Pee);
        let wake_at = events[1].timestamp;
        assert!(T0 < wake_at && wake_at < t1);

        let stats = tracker.compute_stats(T0, t1 + 1).unwrap();
        assert_eq!(stats.sleep_session_count, 1);
        assert_eq!(stats.sleep_total_ms, wake_at - T0);
        assert_eq!(stats.avg_sleep_session_ms, wake_at - T0);
        assert_eq!(stats.pee_count, 1);
    }

    #[test]
    fn record_returns_synthetic_wake_first() {
        let (_dir, tracker) = tracker();
        tracker.update(EventName::Sleep, T0).unwrap();

        let stored = tracker.record(EventName::FeedLeftStart, T0 + HOUR).unwrap();
        let summary: Vec<(EventName, i64)> =
            stored.iter().map(|e| (e.name, e.timestamp)).collect();
        assert_eq!(
            summary,
            vec![
                (EventName::Wake, T0 + HOUR - 1_000),
                (EventName::FeedLeftStart, T0 + HOUR),
            ]
        );
    }

    #[test]
    fn session_started_before_window_is_clipped_not_counted() {
        let (_dir, tracker) = tracker();
        tracker.save(T0, EventName::Sleep).unwrap();
        tracker.save(T0 + 30 * MINUTE, EventName::Wake).unwrap();

        let stats = tracker
            .compute_stats(T0 + 10 * MINUTE, T0 + 40 * MINUTE)
            .unwrap();
        assert_eq!(stats.sleep_total_ms, 20 * MINUTE);
        assert_eq!(stats.sleep_session_count, 0);
        assert_eq!(stats.avg_sleep_session_ms, 0);
    }

    #[test]
    fn open_session_runs_to_window_end() {
        let (_dir, tracker) = tracker();
        tracker.save(T0, EventName::Sleep).unwrap();

        let stats = tracker.compute_stats(T0, T0 + 2 * HOUR).unwrap();
        assert_eq!(stats.sleep_total_ms, 2 * HOUR);
        assert_eq!(stats.sleep_session_count, 0);
        assert_eq!(stats.avg_sleep_session_ms, 0);
    }

    #[test]
    fn empty_window_is_all_zero() {
        let (_dir, tracker) = tracker();

        let stats = tracker.compute_stats(T0, T0 + HOUR).unwrap();
        assert_eq!(
            stats,
            StatsResult {
                window_start: T0,
                window_end: T0 + HOUR,
                ..StatsResult::default()
            }
        );
        assert_eq!(tracker.compute_stats(T0, T0).unwrap().sleep_total_ms, 0);
    }

    #[test]
    fn stats_for_period_uses_trailing_window() {
        let (_dir, tracker) = tracker();
        let now = Utc.timestamp_millis_opt(T0 + 3 * HOUR).unwrap();
        tracker.save(T0, EventName::Poop).unwrap();
        tracker.save(T0 + 2 * HOUR + 30 * MINUTE, EventName::Pee).unwrap();

        let hour = tracker.stats_for_period(Period::Hour, &now).unwrap();
        assert_eq!((hour.pee_count, hour.poop_count), (1, 0));

        let day = tracker.stats_for_period(Period::Day, &now).unwrap();
        assert_eq!((day.pee_count, day.poop_count), (1, 1));
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let (_dir, tracker) = tracker();
        tracker.save(T0, EventName::Pee).unwrap();

        assert!(!tracker.delete(T0 + 101).unwrap());
        assert!(tracker.delete(T0 + 100).unwrap());
        assert!(tracker.get_all().unwrap().is_empty());
    }

    #[test]
    fn change_timestamp_moves_event() {
        let (_dir, tracker) = tracker();
        tracker.save(T0, EventName::FeedRightStart).unwrap();
        let event = tracker.get_all().unwrap().remove(0);

        assert!(tracker.change_timestamp(&event, T0 + HOUR).unwrap());

        let events = tracker.get_all().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, event.id);
        assert_eq!(events[0].timestamp, T0 + HOUR);
    }

    #[test]
    fn change_timestamp_of_missing_event_still_appends() {
        let (_dir, tracker) = tracker();
        let ghost = Event::new(EventId::new("ghost").unwrap(), T0, EventName::Pee);

        assert!(tracker.change_timestamp(&ghost, T0 + MINUTE).unwrap());
        assert_eq!(tracker.get_all().unwrap()[0].timestamp, T0 + MINUTE);
    }

    #[test]
    fn update_event_name_keeps_identity() {
        let config = TrackerConfig {
            author: Some("dad".into()),
            ..TrackerConfig::default()
        };
        let (_dir, tracker) = tracker_with(Mode::Sandbox, config);
        tracker.save(T0, EventName::Pee).unwrap();
        let before = tracker.get_all().unwrap().remove(0);

        assert!(tracker.update_event_name(T0 + 50, EventName::Poop).unwrap());
        assert!(!tracker.update_event_name(T0 + HOUR, EventName::Poop).unwrap());

        let after = tracker.get_all().unwrap().remove(0);
        assert_eq!(after.name, EventName::Poop);
        assert_eq!(after.id, before.id);
        assert_eq!(after.author.as_deref(), Some("dad"));
        assert_eq!(after.timestamp, T0);
    }

    #[test]
    fn reset_sandbox_leaves_production_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(
            &dir.path().join("ledger.db"),
            StoreConfig::default(),
            Duration::from_secs(300),
        );
        let tenant = TenantId::new("alice").unwrap();
        let production = Tracker::new(
            Arc::clone(&store),
            Namespace::new(tenant.clone(), Mode::Production),
            TrackerConfig::default(),
        );
        let sandbox = Tracker::new(
            store,
            Namespace::new(tenant, Mode::Sandbox),
            TrackerConfig::default(),
        );
        production.save(T0, EventName::Pee).unwrap();
        sandbox.save(T0, EventName::Poop).unwrap();
        sandbox.save(T0 + 1, EventName::Pee).unwrap();

        assert_eq!(production.reset_sandbox().unwrap(), 2);
        assert!(sandbox.get_all().unwrap().is_empty());
        assert_eq!(production.get_all().unwrap().len(), 1);
    }

    #[test]
    fn current_state_skips_malformed_members() {
        let (_dir, tracker) = tracker();
        tracker.save(T0, EventName::Sleep).unwrap();
        insert_raw(tracker.ledger(), T0 + MINUTE, "garbage").unwrap();

        let state = tracker.current_state(T0 + HOUR).unwrap();
        assert_eq!(state.activity, bc_core::Activity::Asleep);
        assert_eq!(state.since, Some(T0));
    }

    #[test]
    fn erase_all_empties_namespace() {
        let (_dir, tracker) = tracker();
        tracker.save(T0, EventName::Pee).unwrap();

        assert!(tracker.erase_all().unwrap());
        assert!(tracker.get_all().unwrap().is_empty());
        assert!(tracker.erase_all().unwrap());
    }

    #[test]
    fn concurrent_saves_are_not_lost() {
        let (_dir, tracker) = tracker();

        std::thread::scope(|scope| {
            for worker in 0..8_i64 {
                let tracker = &tracker;
                scope.spawn(move || {
                    for i in 0..10 {
                        tracker.save(T0 + worker * 100 + i, EventName::Pee).unwrap();
                    }
                });
            }
        });

        assert_eq!(tracker.get_all().unwrap().len(), 80);
        assert_eq!(tracker.pool_stats().created, 1);
    }
}
