//! The reqwest-backed collector client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::{Value, json};
use tracing::debug;

use super::error::ApiError;
use super::token::TokenProvider;
use crate::delivery::CollectorTransport;
use crate::queue::QueuedRequest;
use crate::types::{BucketId, Event};

/// HTTP client for the collector REST API.
///
/// All endpoints are relative to `{server_url}/api/0/`. Every request carries
/// an `Authorization` header when the injected [`TokenProvider`] has a token;
/// requests are attempted without one otherwise (the delivery worker gates
/// connection attempts on token availability before it gets here).
pub struct ApiClient {
    http: reqwest::Client,
    server_url: String,
    client_name: String,
    hostname: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    /// Builds a client with connect/read timeouts applied to every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(
        server_url: impl Into<String>,
        client_name: impl Into<String>,
        hostname: impl Into<String>,
        request_timeout: Duration,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(ApiError::from_reqwest)?;

        Ok(ApiClient {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            client_name: client_name.into(),
            hostname: hostname.into(),
            tokens,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/0/{}", self.server_url, endpoint)
    }

    /// POSTs a JSON payload to an endpoint relative to the API root.
    ///
    /// # Errors
    ///
    /// Returns a categorized [`ApiError`] for connection failures and
    /// non-2xx statuses.
    pub async fn post(&self, endpoint: &str, payload: &Value) -> Result<(), ApiError> {
        let mut request = self.http.post(self.url(endpoint)).json(payload);
        if let Some(token) = self.tokens.token() {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request.send().await.map_err(ApiError::from_reqwest)?;
        let status = response.status();
        response.error_for_status().map_err(ApiError::from_reqwest)?;

        debug!(endpoint, %status, "collector POST succeeded");
        Ok(())
    }

    /// Creates a bucket. Idempotent: creating an existing bucket is a no-op
    /// server-side.
    pub async fn create_bucket(
        &self,
        bucket_id: &BucketId,
        event_type: &str,
    ) -> Result<(), ApiError> {
        let payload = json!({
            "client": self.client_name,
            "hostname": self.hostname,
            "type": event_type,
        });
        self.post(&format!("buckets/{}", bucket_id), &payload).await
    }

    /// POSTs a single heartbeat immediately, bypassing the durable queue.
    ///
    /// The queued path in [`crate::client::PulseClient::heartbeat`] is the
    /// normal route; this is for callers that want an awaited, synchronous
    /// delivery.
    pub async fn post_heartbeat(
        &self,
        bucket_id: &BucketId,
        pulsetime: f64,
        event: &Event,
    ) -> Result<(), ApiError> {
        let endpoint = format!("buckets/{}/heartbeat?pulsetime={}", bucket_id, pulsetime);
        let payload = serde_json::to_value(event).map_err(|e| ApiError {
            kind: super::error::ApiErrorKind::Other,
            status_code: None,
            message: format!("failed to serialize heartbeat: {e}"),
            source: None,
        })?;
        self.post(&endpoint, &payload).await
    }
}

#[async_trait]
impl CollectorTransport for ApiClient {
    fn has_credentials(&self) -> bool {
        self.tokens.token().is_some()
    }

    async fn create_bucket(&self, bucket: &BucketId, event_type: &str) -> Result<(), ApiError> {
        ApiClient::create_bucket(self, bucket, event_type).await
    }

    async fn deliver(&self, request: &QueuedRequest) -> Result<(), ApiError> {
        self.post(&request.endpoint, &request.payload).await
    }
}
