//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use bc_core::Event;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(second|minute|hour|day|week)s?\s+ago$").unwrap()
});

/// Conservative bounds for relative time parsing (~1000 years in seconds).
const MAX_RELATIVE_SECONDS: i64 = 1000 * 365 * 24 * 60 * 60;

/// Parse a timestamp argument into epoch milliseconds.
///
/// Supports:
/// - RFC 3339: "2026-01-15T10:30:00Z"
/// - Relative: "45 seconds ago", "2 hours ago", "1 day ago"
/// - "now"
/// - Epoch milliseconds: "1736935200000"
pub fn parse_timestamp(s: &str) -> anyhow::Result<i64> {
    parse_timestamp_at(s, Utc::now())
}

/// [`parse_timestamp`] with an explicit "now".
pub fn parse_timestamp_at(s: &str, now: DateTime<Utc>) -> anyhow::Result<i64> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Ok(now.timestamp_millis());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }

    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .with_context(|| format!("epoch milliseconds out of range: {s}"));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid timestamp: {s}. Use RFC 3339 (e.g., 2026-01-15T10:30:00Z), relative (e.g., '2 hours ago'), or epoch milliseconds"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let seconds_per_unit = match &caps[2] {
        "second" => 1,
        "minute" => 60,
        "hour" => 60 * 60,
        "day" => 60 * 60 * 24,
        "week" => 60 * 60 * 24 * 7,
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > MAX_RELATIVE_SECONDS / seconds_per_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok((now - Duration::seconds(n * seconds_per_unit)).timestamp_millis())
}

/// Formats epoch milliseconds as RFC 3339 UTC, keeping milliseconds only
/// when they are non-zero.
pub fn format_timestamp(ms: i64) -> String {
    let Some(dt) = DateTime::<Utc>::from_timestamp_millis(ms) else {
        return ms.to_string();
    };
    let precision = if ms.rem_euclid(1_000) == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Millis
    };
    dt.to_rfc3339_opts(precision, true)
}

/// Formats a duration as hours and minutes (e.g., "2h 30m", "45m").
pub fn format_duration(ms: i64) -> String {
    if ms < 0 {
        return "0m".to_string();
    }
    let total_minutes = ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// One-line rendering of an event: timestamp, name, and author.
pub fn format_event(event: &Event) -> String {
    let mut line = format!("{}  {}", format_timestamp(event.timestamp), event.name);
    if let Some(author) = &event.author {
        line.push_str(&format!("  ({author})"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    use bc_core::{EventId, EventName};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let ms = parse_timestamp_at("2025-01-15T13:00:00+01:00", now()).unwrap();
        assert_eq!(ms, now().timestamp_millis());
    }

    #[test]
    fn parses_epoch_millis() {
        assert_eq!(
            parse_timestamp_at("1736942400000", now()).unwrap(),
            1_736_942_400_000
        );
    }

    #[test]
    fn parses_relative_times() {
        let base = now().timestamp_millis();
        assert_eq!(parse_timestamp_at("now", now()).unwrap(), base);
        assert_eq!(
            parse_timestamp_at("30 seconds ago", now()).unwrap(),
            base - 30_000
        );
        assert_eq!(
            parse_timestamp_at("2 hours ago", now()).unwrap(),
            base - 2 * 3_600_000
        );
        assert_eq!(
            parse_timestamp_at("1 week ago", now()).unwrap(),
            base - 7 * 86_400_000
        );
    }

    #[test]
    fn rejects_garbage_and_huge_values() {
        assert!(parse_timestamp_at("yesterday-ish", now()).is_err());
        assert!(parse_timestamp_at("", now()).is_err());
        assert!(parse_timestamp_at("99999999999 weeks ago", now()).is_err());
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(format_timestamp(1_736_942_400_000), "2025-01-15T12:00:00Z");
        assert_eq!(
            format_timestamp(1_736_942_400_250),
            "2025-01-15T12:00:00.250Z"
        );
    }

    #[test]
    fn format_duration_hours_and_minutes() {
        assert_eq!(format_duration(9_000_000), "2h 30m");
        assert_eq!(format_duration(2_700_000), "45m");
        assert_eq!(format_duration(59_999), "0m");
        assert_eq!(format_duration(-5), "0m");
    }

    #[test]
    fn formats_event_with_author() {
        let event = Event::new(
            EventId::new("e").unwrap(),
            1_736_942_400_000,
            EventName::FeedLeftStart,
        )
        .with_author(Some("mum".into()));
        assert_eq!(
            format_event(&event),
            "2025-01-15T12:00:00Z  feedLeftStart  (mum)"
        );
    }
}
