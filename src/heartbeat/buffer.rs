//! Per-bucket single-slot cache for not-yet-flushed heartbeats.
//!
//! Each bucket holds at most one pending heartbeat: the most recent
//! observation that has not been pushed to the durable queue. Every incoming
//! heartbeat either merges into the pending one, replaces it (flushing the
//! old one), or, once the pending has accumulated `commit_interval` seconds,
//! flushes the merged result.
//!
//! Pending heartbeats are never persisted; losing the one in-flight slot on a
//! crash costs at most one coalescing window of data.

use std::collections::HashMap;

use crate::heartbeat::merge::try_merge;
use crate::types::{BucketId, Event};

/// The pre-merge buffer: bucket id → pending heartbeat.
///
/// Not internally synchronized; the owner serializes access (the client
/// facade wraps it in a mutex so producer threads take turns).
#[derive(Debug, Default)]
pub struct PendingHeartbeats {
    pending: HashMap<BucketId, Event>,
}

impl PendingHeartbeats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits a heartbeat for `bucket_id`, returning the event to flush to
    /// the durable queue, if any. At most one flush per call.
    ///
    /// The flush decision on a successful merge inspects the duration the
    /// pending heartbeat had accumulated *before* this merge: once that
    /// reaches `commit_interval`, the merged result is flushed and the raw
    /// incoming event restarts accumulation. This matches the collector
    /// client's historical behavior: a long-idle bucket that suddenly
    /// receives a burst flushes one heartbeat later than the interval alone
    /// would suggest.
    pub fn submit(
        &mut self,
        bucket_id: &BucketId,
        event: Event,
        pulsetime: f64,
        commit_interval: f64,
    ) -> Option<Event> {
        let Some(last) = self.pending.get(bucket_id) else {
            self.pending.insert(bucket_id.clone(), event);
            return None;
        };
        let accumulated = last.duration;

        match try_merge(last, &event, pulsetime) {
            Some(merged) => {
                if accumulated >= commit_interval {
                    self.pending.insert(bucket_id.clone(), event);
                    Some(merged)
                } else {
                    self.pending.insert(bucket_id.clone(), merged);
                    None
                }
            }
            // Not mergeable: the old pending is final, flush it.
            None => self.pending.insert(bucket_id.clone(), event),
        }
    }

    /// The current pending heartbeat for a bucket, if any.
    pub fn pending(&self, bucket_id: &BucketId) -> Option<&Event> {
        self.pending.get(bucket_id)
    }

    /// Number of buckets with a pending heartbeat.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{event, ts};
    use proptest::prelude::*;

    fn bucket(name: &str) -> BucketId {
        BucketId::new(name)
    }

    // ─── Basic behavior ───

    #[test]
    fn first_submit_stores_pending_without_flush() {
        let mut buf = PendingHeartbeats::new();
        let flush = buf.submit(&bucket("b"), event(0.0, 0.0, &[("app", "x")]), 60.0, 10.0);
        assert!(flush.is_none());
        assert_eq!(buf.pending(&bucket("b")).unwrap().timestamp, ts(0.0));
    }

    #[test]
    fn merge_below_commit_interval_keeps_merged_pending() {
        let mut buf = PendingHeartbeats::new();
        buf.submit(&bucket("b"), event(0.0, 0.0, &[("app", "x")]), 60.0, 10.0);
        let flush = buf.submit(&bucket("b"), event(5.0, 0.0, &[("app", "x")]), 60.0, 10.0);

        assert!(flush.is_none());
        let pending = buf.pending(&bucket("b")).unwrap();
        assert_eq!(pending.timestamp, ts(0.0));
        assert_eq!(pending.duration, 5.0);
    }

    #[test]
    fn data_change_flushes_old_pending() {
        let mut buf = PendingHeartbeats::new();
        buf.submit(&bucket("b"), event(0.0, 0.0, &[("app", "x")]), 60.0, 10.0);
        buf.submit(&bucket("b"), event(5.0, 0.0, &[("app", "x")]), 60.0, 10.0);
        let flush = buf.submit(&bucket("b"), event(20.0, 0.0, &[("app", "y")]), 60.0, 10.0);

        let flushed = flush.unwrap();
        assert_eq!(flushed.timestamp, ts(0.0));
        assert_eq!(flushed.duration, 5.0);

        let pending = buf.pending(&bucket("b")).unwrap();
        assert_eq!(pending.timestamp, ts(20.0));
        assert_eq!(pending.duration, 0.0);
    }

    #[test]
    fn commit_interval_flushes_merged_and_restarts_from_raw_event() {
        let mut buf = PendingHeartbeats::new();
        buf.submit(&bucket("b"), event(0.0, 0.0, &[("app", "x")]), 60.0, 10.0);
        // Accumulate to 12s, past the 10s commit interval.
        assert!(
            buf.submit(&bucket("b"), event(12.0, 0.0, &[("app", "x")]), 60.0, 10.0)
                .is_none()
        );

        // Pre-merge pending duration (12s) >= commit interval: flush merged.
        let flush = buf.submit(&bucket("b"), event(15.0, 0.0, &[("app", "x")]), 60.0, 10.0);
        let flushed = flush.unwrap();
        assert_eq!(flushed.timestamp, ts(0.0));
        assert_eq!(flushed.duration, 15.0);

        // Accumulation restarted from the raw arrival, not the merged event.
        let pending = buf.pending(&bucket("b")).unwrap();
        assert_eq!(pending.timestamp, ts(15.0));
        assert_eq!(pending.duration, 0.0);
    }

    #[test]
    fn buckets_are_independent() {
        let mut buf = PendingHeartbeats::new();
        buf.submit(&bucket("a"), event(0.0, 0.0, &[("app", "x")]), 60.0, 10.0);
        let flush = buf.submit(&bucket("b"), event(0.0, 0.0, &[("app", "y")]), 60.0, 10.0);
        assert!(flush.is_none());
        assert_eq!(buf.len(), 2);
    }

    /// The concrete scenario: pulsetime=60, commit=10, heartbeats at t=0 and
    /// t=5 with data A merge into a pending of duration 5; a third at t=20
    /// with data B flushes `{t=0, dur=5, A}` and leaves `{t=20, dur=0, B}`
    /// pending.
    #[test]
    fn coalescing_scenario() {
        let mut buf = PendingHeartbeats::new();
        let a = [("data", "A")];
        let b = [("data", "B")];

        assert!(buf.submit(&bucket("s"), event(0.0, 0.0, &a), 60.0, 10.0).is_none());
        assert!(buf.submit(&bucket("s"), event(5.0, 0.0, &a), 60.0, 10.0).is_none());

        let pending = buf.pending(&bucket("s")).unwrap();
        assert_eq!(pending.duration, 5.0);

        let flushed = buf
            .submit(&bucket("s"), event(20.0, 0.0, &b), 60.0, 10.0)
            .unwrap();
        assert_eq!(flushed.timestamp, ts(0.0));
        assert_eq!(flushed.duration, 5.0);
        assert_eq!(flushed.data, crate::test_utils::data(&a));

        let pending = buf.pending(&bucket("s")).unwrap();
        assert_eq!(pending.timestamp, ts(20.0));
        assert_eq!(pending.duration, 0.0);
        assert_eq!(pending.data, crate::test_utils::data(&b));
    }

    // ─── Properties ───

    proptest! {
        /// No data loss: for a chain of data-equal heartbeats whose gaps stay
        /// within pulsetime, the flushed events plus the final pending cover
        /// the full observed span `[t0, last_end]` with no holes.
        #[test]
        fn flushes_plus_pending_cover_observed_span(
            gaps in prop::collection::vec(0.0f64..30.0, 1..40),
            durations in prop::collection::vec(0.0f64..5.0, 40),
            commit_interval in 1.0f64..60.0,
        ) {
            let pulsetime = 30.0;
            let mut buf = PendingHeartbeats::new();
            let b = bucket("cov");

            let mut t = 0.0;
            let mut inputs = Vec::new();
            for (gap, dur) in gaps.iter().zip(&durations) {
                inputs.push((t, *dur));
                t += gap;
            }

            let mut covered: Vec<(f64, f64)> = Vec::new();
            for (at, dur) in &inputs {
                if let Some(flushed) = buf.submit(
                    &b,
                    event(*at, *dur, &[("app", "x")]),
                    pulsetime,
                    commit_interval,
                ) {
                    let start = (flushed.timestamp - ts(0.0)).as_seconds_f64();
                    covered.push((start, start + flushed.duration));
                }
            }
            if let Some(pending) = buf.pending(&b) {
                let start = (pending.timestamp - ts(0.0)).as_seconds_f64();
                covered.push((start, start + pending.duration));
            }

            let last_end = inputs
                .iter()
                .map(|(at, dur)| at + dur)
                .fold(0.0f64, f64::max);

            // Merge the covered intervals and check for a single contiguous
            // span from the first observation to the last end.
            covered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
            let mut merged: Vec<(f64, f64)> = Vec::new();
            for (start, end) in covered {
                match merged.last_mut() {
                    Some((_, prev_end)) if start <= *prev_end + 1e-6 => {
                        *prev_end = prev_end.max(end);
                    }
                    _ => merged.push((start, end)),
                }
            }

            prop_assert_eq!(merged.len(), 1, "coverage has holes: {:?}", merged);
            let (start, end) = merged[0];
            prop_assert!(start.abs() < 1e-6);
            prop_assert!((end - last_end).abs() < 1e-6);
        }

        /// Commit-interval bound: whenever a merge is absorbed without a
        /// flush, the pending it merged into had accumulated less than
        /// `commit_interval`.
        #[test]
        fn absorbed_merges_only_below_commit_interval(
            gaps in prop::collection::vec(0.0f64..8.0, 1..40),
            commit_interval in 1.0f64..20.0,
        ) {
            let pulsetime = 10.0;
            let mut buf = PendingHeartbeats::new();
            let b = bucket("bound");

            let mut t = 0.0;
            for gap in gaps {
                let before = buf.pending(&b).map(|e| e.duration);
                let flush = buf.submit(&b, event(t, 0.0, &[("app", "x")]), pulsetime, commit_interval);
                if let (Some(before), None) = (before, flush) {
                    prop_assert!(
                        before < commit_interval,
                        "pending of {}s was held past commit interval {}s",
                        before,
                        commit_interval
                    );
                }
                t += gap;
            }
        }
    }
}
