//! Event name enum as the single source of truth for event name strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical activity categories recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Sleep,
    Wake,
    FeedLeftStart,
    FeedLeftStop,
    FeedRightStart,
    FeedRightStop,
    Pee,
    Poop,
}

/// Breast side of a feeding session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl EventName {
    pub const ALL: [Self; 8] = [
        Self::Sleep,
        Self::Wake,
        Self::FeedLeftStart,
        Self::FeedLeftStop,
        Self::FeedRightStart,
        Self::FeedRightStop,
        Self::Pee,
        Self::Poop,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Wake => "wake",
            Self::FeedLeftStart => "feedLeftStart",
            Self::FeedLeftStop => "feedLeftStop",
            Self::FeedRightStart => "feedRightStart",
            Self::FeedRightStop => "feedRightStop",
            Self::Pee => "pee",
            Self::Poop => "poop",
        }
    }

    /// `sleep` or `wake`.
    #[must_use]
    pub const fn is_sleep_related(self) -> bool {
        matches!(self, Self::Sleep | Self::Wake)
    }

    #[must_use]
    pub const fn is_diaper(self) -> bool {
        matches!(self, Self::Pee | Self::Poop)
    }

    /// The side this event opens a feeding session on, if any.
    #[must_use]
    pub const fn feed_start_side(self) -> Option<Side> {
        match self {
            Self::FeedLeftStart => Some(Side::Left),
            Self::FeedRightStart => Some(Side::Right),
            _ => None,
        }
    }

    /// The side this event closes a feeding session on, if any.
    #[must_use]
    pub const fn feed_stop_side(self) -> Option<Side> {
        match self {
            Self::FeedLeftStop => Some(Side::Left),
            Self::FeedRightStop => Some(Side::Right),
            _ => None,
        }
    }

    /// Whether this event ends an ongoing sleep when it arrives during one.
    ///
    /// Only diaper changes and feed starts interrupt sleep.
    #[must_use]
    pub const fn interrupts_sleep(self) -> bool {
        self.is_diaper() || self.feed_start_side().is_some()
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = UnknownEventName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sleep" | "nap" => Ok(Self::Sleep),
            "wake" => Ok(Self::Wake),
            "feedLeftStart" | "leftBoob" => Ok(Self::FeedLeftStart),
            "feedLeftStop" | "leftBoobStop" => Ok(Self::FeedLeftStop),
            "feedRightStart" | "rightBoob" => Ok(Self::FeedRightStart),
            "feedRightStop" | "rightBoobStop" => Ok(Self::FeedRightStop),
            "pee" => Ok(Self::Pee),
            "poop" | "poo" => Ok(Self::Poop),
            _ => Err(UnknownEventName(s.to_string())),
        }
    }
}

impl Serialize for EventName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event name strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventName(String);

impl fmt::Display for UnknownEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event name: {}", self.0)
    }
}

impl std::error::Error for UnknownEventName {}
