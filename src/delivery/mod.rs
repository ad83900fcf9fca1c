//! Background delivery of queued requests.
//!
//! The [`DeliveryWorker`] owns the durable queue's consumer cursor and a
//! connectivity state machine, and drains the queue to the collector with
//! retry and backoff. It talks to the network through the
//! [`CollectorTransport`] seam so the state machine is testable with a
//! scripted transport and no real network or credentials.

pub mod worker;

use async_trait::async_trait;

use crate::api::ApiError;
use crate::queue::QueuedRequest;
use crate::types::BucketId;

pub use worker::{ConnState, DeliveryConfig, DeliveryWorker};

/// A bucket registered for creation on the next successful connection.
///
/// Bucket creation is idempotent server-side, so re-running the probe after
/// a reconnect is harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRegistration {
    pub id: BucketId,
    pub event_type: String,
}

/// The worker's view of the collector: credential availability, bucket
/// creation, and delivery of one queued request.
#[async_trait]
pub trait CollectorTransport: Send + Sync {
    /// True when an auth token is currently available.
    fn has_credentials(&self) -> bool;

    /// Creates a bucket (idempotent server-side).
    async fn create_bucket(&self, bucket: &BucketId, event_type: &str) -> Result<(), ApiError>;

    /// POSTs one queued request.
    async fn deliver(&self, request: &QueuedRequest) -> Result<(), ApiError>;
}
