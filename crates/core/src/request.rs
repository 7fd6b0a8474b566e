use crate::error::{Error, Result};

pub const EXPECTED_FORMAT: &str = "Expected URL format: /<prefix>/<containerName>/<blobPath>";

/// A validated request for one asset in one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    container: String,
    path: String,
}

impl AssetRequest {
    /// Build a request from a container name and a slash-separated path.
    pub fn new(container: impl Into<String>, path: impl Into<String>) -> Result<Self> {
        let container = container.into();
        let path = path.into();
        validate_container(&container)?;
        validate_blob_path(&path)?;
        Ok(Self { container, path })
    }

    /// Build a request from inbound path segments: the first segment names
    /// the container and the rest, re-joined with `/`, is the blob path.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Result<Self> {
        if segments.len() < 2 {
            return Err(Error::InvalidRequest(EXPECTED_FORMAT.to_string()));
        }
        let container = segments[0].as_ref();
        let rest: Vec<&str> = segments[1..].iter().map(|s| s.as_ref()).collect();
        Self::new(container, rest.join("/"))
    }

    /// Parse the wildcard tail of a URL such as `demo/Build/app.wasm`.
    pub fn from_url_path(tail: &str) -> Result<Self> {
        if tail.is_empty() {
            return Err(Error::InvalidRequest(EXPECTED_FORMAT.to_string()));
        }
        let segments: Vec<&str> = tail.split('/').collect();
        Self::from_segments(&segments)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn validate_container(container: &str) -> Result<()> {
    if container.is_empty() {
        return Err(Error::InvalidRequest(
            "Container name must not be empty".to_string(),
        ));
    }
    if container.contains('/') {
        return Err(Error::InvalidRequest(format!(
            "Container name must be a single path segment: '{}'",
            container
        )));
    }
    if container == ".." {
        return Err(Error::InvalidRequest(
            "Parent directory references (..) not allowed in container name".to_string(),
        ));
    }
    Ok(())
}

/// Validate a blob path.
///
/// Rejects:
/// - Empty paths
/// - Empty segments (`a//b`, leading or trailing `/`)
/// - Parent directory references (`..`)
///
/// ```text
/// validate_blob_path("Build/app.wasm")     → Ok(())
/// validate_blob_path("Build//app.wasm")    → Err("Empty path segment...")
/// validate_blob_path("../secrets/key.pem") → Err("Parent directory references...")
/// ```
fn validate_blob_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidRequest(EXPECTED_FORMAT.to_string()));
    }

    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "Empty path segment in '{}'",
                path
            )));
        }
        if segment == ".." {
            return Err(Error::InvalidRequest(format!(
                "Parent directory references (..) not allowed in '{}'",
                path
            )));
        }
    }

    Ok(())
}
