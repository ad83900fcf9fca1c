//! Crash-safe, ordered, on-disk queue of flush-ready requests.
//!
//! Flushed heartbeats are appended to a JSON-lines record log before any
//! network delivery is attempted. A sidecar cursor file records the highest
//! acknowledged record; an item is acknowledged only after the POST it
//! represents has succeeded. A crash between POST success and
//! acknowledgement therefore re-delivers at most one item, acceptable
//! because the collector's merge-on-ingest collapses overlapping intervals.
//!
//! The queue is scoped to the client identity (client name, server host and
//! port, user) and its filename carries a format version, so concurrent
//! clients for different servers or users never collide and a format change
//! invalidates old queues instead of misreading them.

pub mod durable;
pub mod fsync;

pub use durable::{DurableQueue, QueueError, QueueIdentity, QueuedRequest, Result};
