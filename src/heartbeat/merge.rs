//! The merge decision for adjacent heartbeats.

use crate::types::Event;

/// Attempts to coalesce `next` into `previous`.
///
/// Returns the merged event iff all of the following hold:
/// - the two events are data-equal,
/// - `next` does not start before `previous` (merging never goes backward),
/// - the gap between the end of `previous` and the start of `next` is at most
///   `pulsetime` seconds.
///
/// The merged event keeps `previous.timestamp`; its duration becomes the
/// larger of `previous.duration` and the span from `previous.timestamp` to
/// the end of `next`. Duration only ever grows.
///
/// Returns `None` when the events cannot be merged, signalling the caller to
/// flush `previous` and start a new pending heartbeat from `next`.
pub fn try_merge(previous: &Event, next: &Event, pulsetime: f64) -> Option<Event> {
    if !previous.data_eq(next) {
        return None;
    }

    let offset = previous.offset_to(next);
    if offset < 0.0 || offset > previous.duration + pulsetime {
        return None;
    }

    Some(Event {
        timestamp: previous.timestamp,
        duration: previous.duration.max(offset + next.duration),
        data: previous.data.clone(),
    })
}
