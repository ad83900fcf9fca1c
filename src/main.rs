//! Synthetic activity watcher demo.
//!
//! Emits heartbeats for a rotating set of fake window observations at a poll
//! interval, exercising the full queued delivery path: pre-merge buffer →
//! durable queue → delivery worker. Point it at a collector (or none; the
//! queue holds everything until one appears) and watch the logs.
//!
//! ```bash
//! PULSE_TOKEN=dev-token pulse-spool --testing --poll-interval 2
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use serde_json::{Map, Value};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_spool::api::EnvTokenProvider;
use pulse_spool::{BucketId, Config, Event, PulseClient};

/// Synthetic activity watcher for the queued heartbeat pipeline.
#[derive(Parser, Debug)]
#[command(name = "pulse-spool")]
#[command(about = "Synthetic activity watcher demo")]
#[command(version)]
struct Args {
    /// Collector host (overrides PULSE_SERVER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Collector port (overrides PULSE_SERVER_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Use the testing profile (testing port, short commit interval)
    #[arg(long)]
    testing: bool,

    /// Seconds between synthetic observations
    #[arg(long, default_value_t = 5.0)]
    poll_interval: f64,
}

/// Fake window observations the demo rotates through.
const WINDOWS: &[(&str, &str)] = &[
    ("firefox", "Collector docs — Mozilla Firefox"),
    ("alacritty", "~/src/pulse-spool"),
    ("code", "worker.rs — pulse-spool"),
];

/// Produces the current fake observation; the active window changes every
/// few ticks so merges and flushes both occur.
fn synthetic_window(tick: u64) -> Map<String, Value> {
    let (app, title) = WINDOWS[(tick / 6) as usize % WINDOWS.len()];
    let mut data = Map::new();
    data.insert("app".to_string(), Value::String(app.to_string()));
    data.insert("title".to_string(), Value::String(title.to_string()));
    data
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse_spool=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.testing {
        // SAFETY: before any threads are spawned.
        unsafe { std::env::set_var("PULSE_TESTING", "1") };
    }

    let mut config = Config::from_env("pulse-watcher-demo");
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let bucket = BucketId::new(format!("{}_{}", config.client_name, config.hostname));
    let tokens = Arc::new(EnvTokenProvider::new("PULSE_TOKEN"));

    let client = PulseClient::new(config, tokens).context("failed to initialize client")?;
    client.create_bucket(bucket.clone(), "currentwindow");
    client.connect();

    info!(bucket = %bucket, poll_interval = args.poll_interval, "watcher started");

    // One second of margin on top of the poll interval, since the loop takes
    // slightly longer than the sleep itself.
    let pulsetime = args.poll_interval + 1.0;
    let poll = Duration::from_secs_f64(args.poll_interval);

    let mut tick: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            _ = tokio::time::sleep(poll) => {
                let event = Event::new(Utc::now(), synthetic_window(tick));
                if let Err(e) = client.heartbeat(&bucket, event, pulsetime, None) {
                    warn!(error = %e, "failed to submit heartbeat");
                }
                tick += 1;
            }
        }
    }

    client.disconnect().await;
    info!(queued = client.queue_size(), "watcher stopped");
    Ok(())
}
