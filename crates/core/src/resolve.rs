//! Logical path to physical object resolution.
//!
//! A request is satisfied by the object at its logical path, or, for the
//! suffixes a WebGL build ships pre-compressed, by `<path>.gz`. No listing
//! or metadata index is consulted: at most two existence probes and one
//! full read per request.

use crate::error::{Error, Result};
use crate::request::AssetRequest;
use crate::store::{ObjectStore, StoreError};
use crate::types::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub fn is_fallback_eligible(path: &str) -> bool {
    FALLBACK_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

pub fn compressed_path(path: &str) -> String {
    format!("{path}{COMPRESSED_SUFFIX}")
}

/// Content type for a logical path. `.framework.js` and `.loader.js` are
/// covered by the `.js` rule.
pub fn content_type_for(logical_path: &str) -> &'static str {
    if logical_path.ends_with(".js") {
        CONTENT_TYPE_JAVASCRIPT
    } else if logical_path.ends_with(".wasm") {
        CONTENT_TYPE_WASM
    } else {
        CONTENT_TYPE_OCTET_STREAM
    }
}

/// Outcome of the plain/compressed existence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackDecision {
    Plain,
    Compressed,
    NotFound,
}

impl FallbackDecision {
    /// Whether the `.gz` variant has to be probed at all.
    pub fn needs_compressed_probe(plain_exists: bool, eligible: bool) -> bool {
        !plain_exists && eligible
    }

    /// `compressed_exists` is `None` when the `.gz` variant was not probed.
    pub fn decide(plain_exists: bool, eligible: bool, compressed_exists: Option<bool>) -> Self {
        match (plain_exists, eligible, compressed_exists) {
            (true, _, _) => FallbackDecision::Plain,
            (false, true, Some(true)) => FallbackDecision::Compressed,
            _ => FallbackDecision::NotFound,
        }
    }

    /// Physical object key for a logical path, if any.
    pub fn physical_path(self, logical_path: &str) -> Option<String> {
        match self {
            FallbackDecision::Plain => Some(logical_path.to_string()),
            FallbackDecision::Compressed => Some(compressed_path(logical_path)),
            FallbackDecision::NotFound => None,
        }
    }

    pub fn is_compressed(self) -> bool {
        self == FallbackDecision::Compressed
    }
}

/// Resolves asset requests against an [`ObjectStore`].
///
/// Holds no per-request state; clones share the same store handle.
pub struct Resolver<S: ?Sized> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: ?Sized> Clone for Resolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: ObjectStore + ?Sized> Resolver<S> {
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the existence checks only.
    pub async fn probe(&self, request: &AssetRequest) -> Result<FallbackDecision> {
        let container = request.container();
        let path = request.path();
        let eligible = is_fallback_eligible(path);

        let plain_exists = self.exists(request, path).await?;
        debug!(container, path, plain_exists, "probed plain object");

        let compressed_exists = if FallbackDecision::needs_compressed_probe(plain_exists, eligible)
        {
            let gz = compressed_path(path);
            debug!(container, path = %gz, "plain object missing, trying compressed variant");
            let found = self.exists(request, &gz).await?;
            debug!(container, path = %gz, found, "probed compressed object");
            Some(found)
        } else {
            None
        };

        Ok(FallbackDecision::decide(
            plain_exists,
            eligible,
            compressed_exists,
        ))
    }

    /// Resolve and read an asset.
    pub async fn resolve(&self, request: &AssetRequest) -> Result<ResolvedAsset> {
        let container = request.container();
        let logical_path = request.path();

        let decision = self.probe(request).await?;
        let Some(physical_path) = decision.physical_path(logical_path) else {
            debug!(container, path = logical_path, "asset not found");
            return Err(Error::NotFound {
                container: container.to_string(),
                path: logical_path.to_string(),
            });
        };

        let payload = self
            .with_timeout(self.store.fetch(container, &physical_path))
            .await
            .map_err(|err| {
                warn!(container, path = %physical_path, error = %err, "content fetch failed");
                Error::from_fetch(container, logical_path, &physical_path, err)
            })?;

        debug!(
            container,
            path = %physical_path,
            bytes = payload.len(),
            "fetched object"
        );

        // A `.gz` object asked for by name is still gzip on the wire.
        let is_compressed =
            decision.is_compressed() || physical_path.ends_with(COMPRESSED_SUFFIX);

        Ok(ResolvedAsset {
            logical_path: logical_path.to_string(),
            is_compressed,
            physical_path,
            content_type: content_type_for(logical_path),
            payload,
        })
    }

    async fn exists(&self, request: &AssetRequest, path: &str) -> Result<bool> {
        self.with_timeout(self.store.exists(request.container(), path))
            .await
            .map_err(|source| {
                warn!(
                    container = request.container(),
                    path,
                    error = %source,
                    "existence probe failed"
                );
                Error::StoreUnavailable {
                    container: request.container().to_string(),
                    path: request.path().to_string(),
                    source,
                }
            })
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> std::result::Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::unavailable(format!(
                "store call timed out after {:?}",
                self.timeout
            ))),
        }
    }
}
