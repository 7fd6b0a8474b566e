use asset_relay_core::{ObjectStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Serves containers from subdirectories of a local root, e.g. a
/// WebGL build output copied to `<root>/<container>/`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, container: &str, path: &str) -> PathBuf {
        let mut full = self.root.join(container);
        for segment in path.split('/') {
            full.push(segment);
        }
        full
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    fn name(&self) -> &'static str {
        "fs"
    }

    async fn exists(&self, container: &str, path: &str) -> Result<bool, StoreError> {
        let full = self.object_path(container, path);
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::unavailable(format!(
                "stat {}: {}",
                full.display(),
                e
            ))),
        }
    }

    async fn fetch(&self, container: &str, path: &str) -> Result<Bytes, StoreError> {
        let full = self.object_path(container, path);
        tokio::fs::read(&full)
            .await
            .map(Bytes::from)
            .map_err(|e| StoreError::failed(format!("read {}: {}", full.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_relay_core::StoreErrorKind;
    use std::fs;

    fn setup() -> (tempfile::TempDir, FsStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("demo/Build")).unwrap();
        fs::write(dir.path().join("demo/Build/app.wasm.gz"), vec![9u8; 500]).unwrap();
        fs::write(dir.path().join("demo/app.loader.js"), b"loader").unwrap();
        let store = FsStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_exists() {
        let (_dir, store) = setup();
        assert!(store.exists("demo", "Build/app.wasm.gz").await.unwrap());
        assert!(store.exists("demo", "app.loader.js").await.unwrap());
        assert!(!store.exists("demo", "Build/app.wasm").await.unwrap());
        assert!(!store.exists("other", "app.loader.js").await.unwrap());
    }

    #[tokio::test]
    async fn test_directories_are_not_objects() {
        let (_dir, store) = setup();
        assert!(!store.exists("demo", "Build").await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch() {
        let (_dir, store) = setup();
        let data = store.fetch("demo", "Build/app.wasm.gz").await.unwrap();
        assert_eq!(data.len(), 500);
        assert_eq!(
            store.fetch("demo", "app.loader.js").await.unwrap(),
            Bytes::from_static(b"loader")
        );
    }

    #[tokio::test]
    async fn test_fetch_missing_is_read_failure() {
        let (_dir, store) = setup();
        let err = store.fetch("demo", "gone.data").await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Failed);
    }
}
