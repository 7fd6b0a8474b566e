// Object store backends for the relay

pub mod azure;
pub mod fs;
pub mod s3;
#[cfg(test)]
mod test_server;

use anyhow::Result;
use asset_relay_core::{ObjectStore, StoreConfig};
use std::sync::Arc;
use tracing::info;

pub use azure::AzureBlobStore;
pub use fs::FsStore;
pub use s3::S3Store;

/// Statuses that mean the service, not the object, is the problem.
pub(crate) fn is_service_fault(status: u16) -> bool {
    matches!(status, 401 | 403 | 429 | 503 | 504)
}

/// Build the configured backend. The returned handle is shared by every
/// request for the lifetime of the process.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config {
        StoreConfig::Azure {
            connection_string_env,
        } => Arc::new(AzureBlobStore::from_env(connection_string_env)?),
        StoreConfig::S3 {
            endpoint_url,
            region,
            force_path_style,
        } => Arc::new(
            S3Store::from_env(endpoint_url.as_deref(), region.as_deref(), *force_path_style).await,
        ),
        StoreConfig::Fs { root } => {
            if !root.is_dir() {
                anyhow::bail!("Store root is not a directory: {}", root.display());
            }
            Arc::new(FsStore::new(root.clone()))
        }
    };
    info!(backend = store.name(), "object store ready");
    Ok(store)
}
