//! The object store seam.
//!
//! The resolver only ever asks two questions of a store: does an object
//! exist, and what are its bytes. Backends live in `asset-relay-store`;
//! `MemoryStore` (behind the `test-util` feature) lets resolver and server
//! tests run without a network.

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(any(test, feature = "test-util"))]
use std::collections::HashMap;
#[cfg(any(test, feature = "test-util"))]
use std::sync::Mutex;
#[cfg(any(test, feature = "test-util"))]
use std::time::Duration;
use thiserror::Error;

/// Whether a store failure is a transport fault or a read fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Connection, auth or timeout failure. Retryable with backoff.
    Unavailable,
    /// The store answered but the object could not be read.
    Failed,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Failed,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }
}

/// Read-only access to a blob store addressed by container and path.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name used in logs and health output.
    fn name(&self) -> &'static str;

    async fn exists(&self, container: &str, path: &str) -> Result<bool, StoreError>;

    /// Read the whole object.
    async fn fetch(&self, container: &str, path: &str) -> Result<Bytes, StoreError>;
}

/// A store call observed by [`MemoryStore`].
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Exists { container: String, path: String },
    Fetch { container: String, path: String },
}

/// In-memory store that records every call made against it.
///
/// The call log is never truncated; use one store per test.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: HashMap<(String, String), Bytes>,
    probe_failure: Option<StoreError>,
    fetch_failure: Option<StoreError>,
    latency: Option<Duration>,
    calls: Mutex<Vec<StoreCall>>,
}

#[cfg(any(test, feature = "test-util"))]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(
        mut self,
        container: impl Into<String>,
        path: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.objects
            .insert((container.into(), path.into()), data.into());
        self
    }

    /// Make every `exists` call fail with `err`.
    pub fn with_probe_failure(mut self, err: StoreError) -> Self {
        self.probe_failure = Some(err);
        self
    }

    /// Make every `fetch` call fail with `err`.
    pub fn with_fetch_failure(mut self, err: StoreError) -> Self {
        self.fetch_failure = Some(err);
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn exists(&self, container: &str, path: &str) -> Result<bool, StoreError> {
        self.record(StoreCall::Exists {
            container: container.to_string(),
            path: path.to_string(),
        });
        self.wait().await;
        if let Some(err) = &self.probe_failure {
            return Err(err.clone());
        }
        Ok(self
            .objects
            .contains_key(&(container.to_string(), path.to_string())))
    }

    async fn fetch(&self, container: &str, path: &str) -> Result<Bytes, StoreError> {
        self.record(StoreCall::Fetch {
            container: container.to_string(),
            path: path.to_string(),
        });
        self.wait().await;
        if let Some(err) = &self.fetch_failure {
            return Err(err.clone());
        }
        self.objects
            .get(&(container.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::failed(format!("object vanished: {container}/{path}")))
    }
}
