use bytes::Bytes;

/// Suffix appended to the physical path of a pre-compressed object.
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// Suffixes for which a missing object is retried as `<path>.gz`.
pub const FALLBACK_SUFFIXES: [&str; 3] = [".data", ".framework.js", ".wasm"];

/// The four files a WebGL build loader requests for one build id.
pub const BUILD_FILE_SUFFIXES: [&str; 4] = [".loader.js", ".data", ".framework.js", ".wasm"];

pub const CONTENT_TYPE_JAVASCRIPT: &str = "application/javascript";
pub const CONTENT_TYPE_WASM: &str = "application/wasm";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// An asset ready to be sent. Created per request and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Path as requested by the client.
    pub logical_path: String,
    /// Object key actually read; `logical_path` or `logical_path + ".gz"`.
    pub physical_path: String,
    pub is_compressed: bool,
    /// Derived from `logical_path`, never from the `.gz` key.
    pub content_type: &'static str,
    pub payload: Bytes,
}

impl ResolvedAsset {
    pub fn size_bytes(&self) -> usize {
        self.payload.len()
    }
}

/// Logical paths of the loader, data, framework and code files of a build.
///
/// ```text
/// build_file_paths("app") → ["app.loader.js", "app.data", "app.framework.js", "app.wasm"]
/// ```
pub fn build_file_paths(build_id: &str) -> Vec<String> {
    BUILD_FILE_SUFFIXES
        .iter()
        .map(|suffix| format!("{build_id}{suffix}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_file_paths() {
        assert_eq!(
            build_file_paths("courses/intro"),
            vec![
                "courses/intro.loader.js",
                "courses/intro.data",
                "courses/intro.framework.js",
                "courses/intro.wasm",
            ]
        );
    }

    #[test]
    fn test_size_bytes_tracks_payload() {
        let asset = ResolvedAsset {
            logical_path: "a.data".into(),
            physical_path: "a.data".into(),
            is_compressed: false,
            content_type: CONTENT_TYPE_OCTET_STREAM,
            payload: Bytes::from(vec![0u8; 42]),
        };
        assert_eq!(asset.size_bytes(), 42);
    }
}
