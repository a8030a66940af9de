//! Named stats periods ending at "now".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveTime, TimeZone};
use thiserror::Error;

use crate::stats::StatsWindow;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// A stats period relative to the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    /// The last hour.
    Hour,
    /// The last 24 hours.
    #[default]
    Day,
    /// The last 48 hours.
    TwoDays,
    /// The last 7 days.
    Week,
    /// Since Sunday 00:00 local time.
    ThisWeek,
}

/// Error type for unknown period names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period: {0} (expected hour, day, days2, week or thisweek)")]
pub struct UnknownPeriod(String);

impl Period {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::TwoDays => "days2",
            Self::Week => "week",
            Self::ThisWeek => "thisweek",
        }
    }

    /// The window `[start, now)` for this period, with calendar boundaries
    /// taken in the time zone of `now`.
    pub fn window_at<Tz: TimeZone>(self, now: &DateTime<Tz>) -> StatsWindow {
        let end = now.timestamp_millis();
        let start = match self {
            Self::Hour => end - HOUR_MS,
            Self::Day => end - DAY_MS,
            Self::TwoDays => end - 2 * DAY_MS,
            Self::Week => end - 7 * DAY_MS,
            Self::ThisWeek => start_of_week(now),
        };
        StatsWindow::new(start, end)
    }
}

/// Most recent Sunday at local midnight.
///
/// Handles DST ambiguity by picking the earlier time, and a DST gap at
/// midnight by using 1am.
fn start_of_week<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let today = now.date_naive();
    let sunday = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    let tz = now.timezone();
    let midnight = sunday.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.timestamp_millis(),
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map_or_else(|| now.timestamp_millis(), |dt| dt.timestamp_millis()),
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "days2" => Ok(Self::TwoDays),
            "week" => Ok(Self::Week),
            "thisweek" => Ok(Self::ThisWeek),
            _ => Err(UnknownPeriod(s.to_string())),
        }
    }
}
