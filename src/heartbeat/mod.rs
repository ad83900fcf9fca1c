//! Heartbeat coalescing: the merge engine and the pre-merge buffer.
//!
//! Frequent, small heartbeats describing the same activity are collapsed into
//! one duration-bearing event before they ever reach the durable queue. Two
//! knobs control the collapse:
//!
//! - **pulsetime**: the maximum gap, in seconds, across which two data-equal
//!   heartbeats may still be merged.
//! - **commit interval**: the maximum duration a merged-but-unflushed
//!   heartbeat may accumulate before being forced onto the durable queue.

pub mod buffer;
pub mod merge;

pub use buffer::PendingHeartbeats;
pub use merge::try_merge;
