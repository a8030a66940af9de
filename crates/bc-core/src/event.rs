//! Timestamped activity events as stored in the ledger.

use serde::{Deserialize, Serialize};

use crate::event_name::EventName;
use crate::types::EventId;

/// A single recorded activity.
///
/// The serialized JSON form of this struct is the ledger member; its
/// `timestamp` doubles as the ordering score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event.
    pub id: EventId,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// The activity category.
    pub name: EventName,
    /// Optional free-text tag naming who recorded the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Event {
    pub fn new(id: EventId, timestamp: i64, name: EventName) -> Self {
        Self {
            id,
            timestamp,
            name,
            author: None,
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    /// Copy of this event at a different timestamp, keeping its identity.
    #[must_use]
    pub fn moved_to(&self, timestamp: i64) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }
}
