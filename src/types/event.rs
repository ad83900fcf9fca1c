//! The heartbeat event type.
//!
//! An event is a timestamped observation of current activity. On the wire it
//! is a JSON object:
//!
//! ```json
//! {"timestamp":"2026-03-01T10:00:00Z","duration":4.5,"data":{"app":"firefox","title":"docs"}}
//! ```
//!
//! Two events with deeply-equal `data` mappings describe the same activity
//! and are candidates for coalescing into a single duration-bearing interval
//! (see [`crate::heartbeat`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single heartbeat observation.
///
/// `duration` is a non-negative span in seconds. Instantaneous observations
/// carry a duration of zero; merging only ever grows the duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// When the observed activity started (UTC).
    pub timestamp: DateTime<Utc>,

    /// How long the observed activity has lasted, in seconds.
    #[serde(default)]
    pub duration: f64,

    /// Arbitrary payload describing the activity (app, title, url, ...).
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Event {
    /// Creates an instantaneous (zero-duration) event.
    pub fn new(timestamp: DateTime<Utc>, data: Map<String, Value>) -> Self {
        Event {
            timestamp,
            duration: 0.0,
            data,
        }
    }

    /// Creates an event with an explicit duration in seconds.
    pub fn with_duration(timestamp: DateTime<Utc>, duration: f64, data: Map<String, Value>) -> Self {
        debug_assert!(duration >= 0.0, "event duration must be non-negative");
        Event {
            timestamp,
            duration,
            data,
        }
    }

    /// Seconds from `self.timestamp` to `other.timestamp`.
    ///
    /// Negative when `other` starts before `self`.
    pub fn offset_to(&self, other: &Event) -> f64 {
        (other.timestamp - self.timestamp).as_seconds_f64()
    }

    /// True if the two events describe the same activity (deep data equality).
    pub fn data_eq(&self, other: &Event) -> bool {
        self.data == other.data
    }
}
