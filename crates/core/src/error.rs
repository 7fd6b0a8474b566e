use crate::store::{StoreError, StoreErrorKind};
use thiserror::Error;

/// Failure taxonomy for a single asset resolution.
///
/// Every variant carries the logical path that was requested so a caller can
/// tell which of the two candidate objects was attempted.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed request, rejected before any store access.
    #[error("{0}")]
    InvalidRequest(String),

    /// Neither the plain object nor its compressed variant exists.
    #[error("File not found: {path}")]
    NotFound { container: String, path: String },

    /// Transport, auth or timeout failure while talking to the store.
    #[error("Object store unavailable while resolving {container}/{path}: {source}")]
    StoreUnavailable {
        container: String,
        path: String,
        #[source]
        source: StoreError,
    },

    /// The object was found but its content could not be read.
    #[error("Failed to read {container}/{physical_path} (requested {path}): {source}")]
    ReadFailure {
        container: String,
        path: String,
        physical_path: String,
        #[source]
        source: StoreError,
    },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::StoreUnavailable { .. } | Error::ReadFailure { .. }
        )
    }

    /// Map a failed content fetch. Transport faults stay `StoreUnavailable`
    /// so that callers back off instead of giving up after one retry.
    pub(crate) fn from_fetch(
        container: &str,
        path: &str,
        physical_path: &str,
        source: StoreError,
    ) -> Self {
        match source.kind() {
            StoreErrorKind::Unavailable => Error::StoreUnavailable {
                container: container.to_string(),
                path: path.to_string(),
                source,
            },
            StoreErrorKind::Failed => Error::ReadFailure {
                container: container.to_string(),
                path: path.to_string(),
                physical_path: physical_path.to_string(),
                source,
            },
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
