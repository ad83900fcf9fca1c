//! The delivery worker's connectivity state machine and dispatch loop.
//!
//! ```text
//! Disconnected ──probe ok──▶ Connected
//!      ▲  ◀─────────────────────┘ network failure
//!      └── probe failed: wait reconnect_interval, retry
//! ```
//!
//! The worker runs as a tokio task. Every wait point (empty-queue poll,
//! failure cooldown, reconnect interval) selects against the shutdown token,
//! so stopping is prompt and never drops queued-but-unacknowledged items;
//! they persist for the next run.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{BucketRegistration, CollectorTransport};
use crate::api::ApiErrorKind;
use crate::queue::DurableQueue;

/// Timing knobs for the delivery loop.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryConfig {
    /// Wait between failed connection probes.
    pub reconnect_interval: Duration,

    /// Wait before re-polling an empty queue.
    pub poll_interval: Duration,

    /// Wait after a transient delivery failure.
    pub cooldown: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        DeliveryConfig {
            reconnect_interval: Duration::from_secs(10),
            poll_interval: Duration::from_millis(200),
            cooldown: Duration::from_millis(500),
        }
    }
}

/// Connectivity state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connecting,
    Connected,
}

/// Drains the durable queue to the collector.
///
/// Exactly one worker owns the queue's consumer cursor at a time; the client
/// facade creates a fresh worker per `connect()` (workers are not
/// restartable once their task finishes).
pub struct DeliveryWorker {
    transport: Arc<dyn CollectorTransport>,
    queue: Arc<Mutex<DurableQueue>>,
    buckets: Arc<Mutex<Vec<BucketRegistration>>>,
    config: DeliveryConfig,
    state: ConnState,
}

impl DeliveryWorker {
    pub fn new(
        transport: Arc<dyn CollectorTransport>,
        queue: Arc<Mutex<DurableQueue>>,
        buckets: Arc<Mutex<Vec<BucketRegistration>>>,
        config: DeliveryConfig,
    ) -> Self {
        DeliveryWorker {
            transport,
            queue,
            buckets,
            config,
            state: ConnState::Disconnected,
        }
    }

    /// Runs until the shutdown token fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("delivery worker started");

        'outer: while !shutdown.is_cancelled() {
            self.set_state(ConnState::Connecting);
            while !self.try_connect().await {
                self.set_state(ConnState::Disconnected);
                let depth = self.queue.lock().size();
                warn!(queued = depth, "not connected to collector, holding queued requests");
                if wait(self.config.reconnect_interval, &shutdown).await {
                    break 'outer;
                }
                self.set_state(ConnState::Connecting);
            }

            if shutdown.is_cancelled() {
                break;
            }
            self.set_state(ConnState::Connected);
            info!("connection to collector established");

            while self.state == ConnState::Connected && !shutdown.is_cancelled() {
                self.dispatch_one(&shutdown).await;
            }
        }

        info!("delivery worker stopped");
    }

    fn set_state(&mut self, state: ConnState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "connectivity state change");
            self.state = state;
        }
    }

    /// The connection probe: credentials must be present, then every
    /// registered bucket is created (idempotent server-side).
    async fn try_connect(&mut self) -> bool {
        if !self.transport.has_credentials() {
            debug!("no auth token available, staying disconnected");
            return false;
        }

        let buckets: Vec<BucketRegistration> = self.buckets.lock().clone();
        for bucket in buckets {
            if let Err(e) = self
                .transport
                .create_bucket(&bucket.id, &bucket.event_type)
                .await
            {
                warn!(bucket = %bucket.id, error = %e, "bucket creation failed during connection probe");
                return false;
            }
        }

        true
    }

    /// Delivers (at most) the oldest queued request.
    ///
    /// - empty queue: short poll wait, state stays `Connected`
    /// - success: ack
    /// - connection failure: demote to `Disconnected`, cooldown, item stays
    /// - HTTP 400: ack anyway, a bad payload can never succeed on retry
    /// - HTTP 5xx: cooldown, no ack, retry the same item
    /// - anything else: ack, unknown failures must not wedge the queue
    async fn dispatch_one(&mut self, shutdown: &CancellationToken) {
        let request = {
            let mut queue = self.queue.lock();
            queue.peek().cloned()
        };

        let Some(request) = request else {
            wait(self.config.poll_interval, shutdown).await;
            return;
        };

        match self.transport.deliver(&request).await {
            Ok(()) => self.ack_current(),
            Err(e) if e.is_connection() => {
                self.set_state(ConnState::Disconnected);
                warn!(
                    "connection refused or timed out, will queue requests until connection is available"
                );
                wait(self.config.cooldown, shutdown).await;
            }
            Err(e) => match e.kind {
                ApiErrorKind::BadRequest => {
                    error!(endpoint = %request.endpoint, error = %e, "collector rejected request, not retrying");
                    self.ack_current();
                }
                ApiErrorKind::Server => {
                    error!(error = %e, "collector internal error, retrying");
                    wait(self.config.cooldown, shutdown).await;
                }
                _ => {
                    error!(endpoint = %request.endpoint, error = %e, "unexpected delivery error, not retrying");
                    self.ack_current();
                }
            },
        }
    }

    fn ack_current(&self) {
        if let Err(e) = self.queue.lock().ack() {
            error!(error = %e, "failed to acknowledge delivered request");
        }
    }
}

/// Sleeps for `duration`, returning true if the shutdown signal fired first.
async fn wait(duration: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}
