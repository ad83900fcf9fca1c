//! HTTP client for the collector's REST API.
//!
//! Only the subset the delivery layer needs: idempotent bucket creation and
//! heartbeat POSTs. Errors are categorized for the delivery worker's retry
//! decisions (connection-level vs. HTTP status classes).

pub mod client;
pub mod error;
pub mod token;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind};
pub use token::{EnvTokenProvider, StaticTokenProvider, TokenProvider};
