//! Client configuration loaded from environment variables.
//!
//! Defaults target a local collector (`127.0.0.1:7600`, commit interval 10s).
//! The testing profile switches to the testing port (5666) and a shorter
//! commit interval (5s), and marks the durable queue's filename so test runs
//! never touch production queues.

use std::path::PathBuf;
use std::time::Duration;

use crate::queue::QueueIdentity;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of this client (e.g., "pulse-watcher-window"). Part of the queue
    /// identity and of the bucket-creation payload.
    pub client_name: String,

    /// Hostname reported to the collector on bucket creation.
    pub hostname: String,

    /// Collector host.
    pub host: String,

    /// Collector port.
    pub port: u16,

    /// Testing profile: testing port/commit-interval defaults and a
    /// `-testing` marker in the queue filename.
    pub testing: bool,

    /// Default commit interval in seconds (overridable per heartbeat call).
    pub commit_interval: f64,

    /// Wait between failed connection probes.
    pub reconnect_interval: Duration,

    /// Connect/read timeout for collector requests.
    pub request_timeout: Duration,

    /// Directory holding the durable queue files.
    pub queue_dir: PathBuf,

    /// User component of the queue identity.
    pub user: String,
}

impl Config {
    /// Loads configuration from environment variables, all optional:
    ///
    /// - `PULSE_SERVER_HOST`: collector host (default: "127.0.0.1")
    /// - `PULSE_SERVER_PORT`: collector port (default: 7600, testing: 5666)
    /// - `PULSE_TESTING`: "1"/"true" enables the testing profile
    /// - `PULSE_COMMIT_INTERVAL`: seconds (default: 10, testing: 5)
    /// - `PULSE_QUEUE_DIR`: queue directory (default: "./data/queued")
    /// - `HOSTNAME` / `USER` (`USERNAME` on Windows): identity components,
    ///   falling back to "unknown"
    pub fn from_env(client_name: impl Into<String>) -> Self {
        let client_name = client_name.into();

        let testing = std::env::var("PULSE_TESTING")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let host =
            std::env::var("PULSE_SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let default_port = if testing { 5666 } else { 7600 };
        let port = std::env::var("PULSE_SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_port);

        let default_commit = if testing { 5.0 } else { 10.0 };
        let commit_interval = std::env::var("PULSE_COMMIT_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &f64| *v > 0.0)
            .unwrap_or(default_commit);

        let queue_dir = std::env::var("PULSE_QUEUE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/queued"));

        let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());

        let config = Config {
            client_name,
            hostname,
            host,
            port,
            testing,
            commit_interval,
            reconnect_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            queue_dir,
            user,
        };

        tracing::info!(
            client = %config.client_name,
            server = %config.server_url(),
            testing = config.testing,
            commit_interval = config.commit_interval,
            queue_dir = %config.queue_dir.display(),
            "client configuration loaded"
        );

        config
    }

    /// Base URL of the collector, without a trailing slash.
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// The identity scoping this client's durable queue.
    pub fn queue_identity(&self) -> QueueIdentity {
        QueueIdentity {
            client_name: self.client_name.clone(),
            testing: self.testing,
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
        }
    }
}
