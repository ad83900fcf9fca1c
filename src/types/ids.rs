//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of identifiers (e.g., using a bucket
//! id where an endpoint string is expected) and make signatures
//! self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a bucket: a named, typed stream that heartbeats belong to.
///
/// Bucket ids are conventionally `{client-name}_{hostname}` (one stream per
/// watcher per host), but any non-empty string is accepted; the collector is
/// the authority on naming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketId(pub String);

impl BucketId {
    pub fn new(s: impl Into<String>) -> Self {
        BucketId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BucketId {
    fn from(s: String) -> Self {
        BucketId(s)
    }
}

impl From<&str> for BucketId {
    fn from(s: &str) -> Self {
        BucketId(s.to_string())
    }
}
