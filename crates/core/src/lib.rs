pub mod config;
pub mod error;
pub mod headers;
pub mod request;
pub mod resolve;
pub mod store;
pub mod types;

pub use config::{RelayConfig, StoreConfig, parse_config};
pub use error::{Error, Result};
pub use headers::{assemble_headers, cors_headers};
pub use request::{AssetRequest, EXPECTED_FORMAT};
pub use resolve::{FallbackDecision, Resolver};
pub use store::{ObjectStore, StoreError, StoreErrorKind};
#[cfg(any(test, feature = "test-util"))]
pub use store::{MemoryStore, StoreCall};
pub use types::*;
