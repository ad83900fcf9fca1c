//! The public client facade.
//!
//! [`PulseClient`] routes heartbeats through the pre-merge buffer into the
//! durable queue and manages the delivery worker's lifecycle. Heartbeat calls
//! never touch the network and never fail due to connectivity; degraded
//! delivery shows up only as queue growth in the worker's logs.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::api::{ApiClient, ApiError, TokenProvider};
use crate::config::Config;
use crate::delivery::{BucketRegistration, DeliveryConfig, DeliveryWorker};
use crate::heartbeat::PendingHeartbeats;
use crate::queue::{DurableQueue, QueueError, QueuedRequest};
use crate::types::{BucketId, Event};

/// Errors surfaced by the client facade.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Durable queue failure (disk).
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Collector API failure (only on the explicit, awaited call paths).
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// A running delivery worker: its stop signal and task handle.
struct WorkerHandle {
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

/// Client for queued heartbeat delivery to a collector.
///
/// Producers on any thread call [`PulseClient::heartbeat`]; one background
/// worker (started by [`PulseClient::connect`]) drains the durable queue.
pub struct PulseClient {
    config: Config,
    api: Arc<ApiClient>,
    buffer: Mutex<PendingHeartbeats>,
    queue: Arc<Mutex<DurableQueue>>,
    buckets: Arc<Mutex<Vec<BucketRegistration>>>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl PulseClient {
    /// Opens the durable queue for this client's identity and builds the
    /// collector API client. No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Fails if the queue cannot be opened (disk error, or another process
    /// holds the same queue) or the HTTP client cannot be built.
    pub fn new(config: Config, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let queue = DurableQueue::open(&config.queue_dir, &config.queue_identity())?;
        let api = ApiClient::new(
            config.server_url(),
            &config.client_name,
            &config.hostname,
            config.request_timeout,
            tokens,
        )?;

        Ok(PulseClient {
            config,
            api: Arc::new(api),
            buffer: Mutex::new(PendingHeartbeats::new()),
            queue: Arc::new(Mutex::new(queue)),
            buckets: Arc::new(Mutex::new(Vec::new())),
            worker: Mutex::new(None),
        })
    }

    /// Submits a heartbeat for coalescing and eventual delivery.
    ///
    /// Non-blocking: at most one flushed request is appended to the durable
    /// queue; the network is never touched on this path. `commit_interval`
    /// overrides the configured default for this call.
    ///
    /// # Errors
    ///
    /// Only disk failures from the durable queue surface here; connectivity
    /// problems never do.
    pub fn heartbeat(
        &self,
        bucket_id: &BucketId,
        event: Event,
        pulsetime: f64,
        commit_interval: Option<f64>,
    ) -> Result<()> {
        let commit_interval = commit_interval.unwrap_or(self.config.commit_interval);

        let flushed = self
            .buffer
            .lock()
            .submit(bucket_id, event, pulsetime, commit_interval);

        if let Some(flushed) = flushed {
            let request = QueuedRequest::heartbeat(bucket_id, pulsetime, &flushed)?;
            self.queue.lock().enqueue(request)?;
            debug!(bucket = %bucket_id, queued = self.queue.lock().size(), "flushed heartbeat to queue");
        }

        Ok(())
    }

    /// Registers a bucket for creation on the next successful connection.
    ///
    /// Creation is idempotent server-side and re-runs on every reconnect
    /// probe, so registering before or after [`PulseClient::connect`] both
    /// work.
    pub fn create_bucket(&self, bucket_id: BucketId, event_type: impl Into<String>) {
        let mut buckets = self.buckets.lock();
        if buckets.iter().any(|b| b.id == bucket_id) {
            return;
        }
        buckets.push(BucketRegistration {
            id: bucket_id,
            event_type: event_type.into(),
        });
    }

    /// Creates a bucket immediately, awaiting the collector's response.
    ///
    /// # Errors
    ///
    /// Surfaces the API failure; nothing is queued on this path.
    pub async fn create_bucket_now(
        &self,
        bucket_id: &BucketId,
        event_type: &str,
    ) -> Result<()> {
        self.api.create_bucket(bucket_id, event_type).await?;
        Ok(())
    }

    /// Re-creates a bucket from scratch: empties the durable queue (queued
    /// heartbeats targeted the old incarnation) and creates the bucket
    /// immediately.
    ///
    /// # Errors
    ///
    /// Surfaces queue and API failures.
    pub async fn recreate_bucket(&self, bucket_id: &BucketId, event_type: &str) -> Result<()> {
        self.queue.lock().reset()?;
        self.api.create_bucket(bucket_id, event_type).await?;
        Ok(())
    }

    /// Starts the delivery worker. A no-op if one is already running; after
    /// a [`PulseClient::disconnect`], a fresh worker is created (workers are
    /// not restartable once stopped).
    ///
    /// Must be called within a tokio runtime.
    pub fn connect(&self) {
        let mut slot = self.worker.lock();
        if slot.is_some() {
            debug!("delivery worker already running");
            return;
        }

        let worker = DeliveryWorker::new(
            self.api.clone(),
            self.queue.clone(),
            self.buckets.clone(),
            DeliveryConfig {
                reconnect_interval: self.config.reconnect_interval,
                ..DeliveryConfig::default()
            },
        );
        let shutdown = CancellationToken::new();
        let join = tokio::spawn(worker.run(shutdown.clone()));
        *slot = Some(WorkerHandle { shutdown, join });
        info!(client = %self.config.client_name, "delivery worker spawned");
    }

    /// Stops the delivery worker and waits for its current iteration to
    /// finish. Idempotent; queued-but-unacknowledged items persist for the
    /// next run.
    pub async fn disconnect(&self) {
        let handle = self.worker.lock().take();
        let Some(handle) = handle else {
            debug!("no delivery worker running");
            return;
        };

        handle.shutdown.cancel();
        if let Err(e) = handle.join.await {
            error!(error = %e, "delivery worker task failed");
        }
    }

    /// Current depth of the durable queue. Diagnostics only.
    pub fn queue_size(&self) -> usize {
        self.queue.lock().size()
    }
}
