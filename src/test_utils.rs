//! Shared test utilities and arbitrary generators for property-based testing.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::types::Event;

/// A fixed base instant; tests express timestamps as offsets from it.
pub fn ts(secs_from_base: f64) -> DateTime<Utc> {
    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    base + chrono::Duration::nanoseconds((secs_from_base * 1e9).round() as i64)
}

/// Builds a string-valued data mapping from key/value pairs.
pub fn data(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

/// Builds an event at `ts(secs)` with the given duration and data pairs.
pub fn event(secs: f64, duration: f64, pairs: &[(&str, &str)]) -> Event {
    Event::with_duration(ts(secs), duration, data(pairs))
}

pub fn arb_data() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,16}", 0..4).prop_map(|m| {
        m.into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    })
}

pub fn arb_event() -> impl Strategy<Value = Event> {
    (0.0f64..3600.0, 0.0f64..120.0, arb_data())
        .prop_map(|(at, duration, data)| Event::with_duration(ts(at), duration, data))
}
