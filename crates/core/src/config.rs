use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_ROUTE_PREFIX: &str = "/api/blob";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECTION_STRING_ENV: &str = "AZURE_STORAGE_CONNECTION_STRING";

/// Raw TOML configuration structure
/// This matches the relay.toml file structure exactly
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    resolver: RawResolver,
    #[serde(default)]
    store: RawStore,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServer {
    bind: Option<String>,
    route_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResolver {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStore {
    backend: Option<String>,
    // azure
    connection_string_env: Option<String>,
    // s3
    endpoint_url: Option<String>,
    region: Option<String>,
    force_path_style: Option<bool>,
    // fs
    root: Option<String>,
}

/// Complete relay configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Normalized: starts with `/`, no trailing `/`. Empty means root.
    pub route_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Upper bound for each store call.
    pub timeout: Duration,
}

/// Which object store backs the relay.
///
/// Credentials never live in the file, only the name of the variable that
/// holds them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Azure {
        connection_string_env: String,
    },
    S3 {
        endpoint_url: Option<String>,
        region: Option<String>,
        force_path_style: bool,
    },
    Fs {
        root: PathBuf,
    },
}

impl StoreConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StoreConfig::Azure { .. } => "azure",
            StoreConfig::S3 { .. } => "s3",
            StoreConfig::Fs { .. } => "fs",
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
                route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            },
            resolver: ResolverConfig {
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            },
            store: StoreConfig::Azure {
                connection_string_env: DEFAULT_CONNECTION_STRING_ENV.to_string(),
            },
        }
    }
}

/// Parse relay.toml from a file path
pub fn parse_config<P: AsRef<Path>>(path: P) -> Result<RelayConfig> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse relay.toml from a string (useful for testing)
pub fn parse_config_str(content: &str) -> Result<RelayConfig> {
    let raw: RawConfig = toml::from_str(content)?;
    convert(raw)
}

fn convert(raw: RawConfig) -> Result<RelayConfig> {
    let bind_str = raw.server.bind.as_deref().unwrap_or(DEFAULT_BIND);
    let bind = bind_str
        .parse::<SocketAddr>()
        .map_err(|e| Error::ConfigParse(format!("Invalid server.bind '{}': {}", bind_str, e)))?;

    let route_prefix = normalize_prefix(
        raw.server
            .route_prefix
            .as_deref()
            .unwrap_or(DEFAULT_ROUTE_PREFIX),
    )?;

    let timeout_secs = raw.resolver.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(Error::ConfigParse(
            "resolver.timeout_secs must be greater than 0".to_string(),
        ));
    }

    Ok(RelayConfig {
        server: ServerConfig { bind, route_prefix },
        resolver: ResolverConfig {
            timeout: Duration::from_secs(timeout_secs),
        },
        store: convert_store(raw.store)?,
    })
}

fn convert_store(raw: RawStore) -> Result<StoreConfig> {
    let backend = raw.backend.as_deref().unwrap_or("azure");
    match backend {
        "azure" => Ok(StoreConfig::Azure {
            connection_string_env: raw
                .connection_string_env
                .unwrap_or_else(|| DEFAULT_CONNECTION_STRING_ENV.to_string()),
        }),
        "s3" => Ok(StoreConfig::S3 {
            endpoint_url: raw.endpoint_url,
            region: raw.region,
            force_path_style: raw.force_path_style.unwrap_or(false),
        }),
        "fs" => {
            let root = raw.root.ok_or_else(|| {
                Error::ConfigParse("store.root is required for the fs backend".to_string())
            })?;
            if root.trim().is_empty() {
                return Err(Error::ConfigParse("Empty path in 'store.root' field".to_string()));
            }
            Ok(StoreConfig::Fs {
                root: PathBuf::from(root),
            })
        }
        other => Err(Error::ConfigParse(format!(
            "Unknown store.backend '{}', expected one of: azure, s3, fs",
            other
        ))),
    }
}

/// Normalize a route prefix.
///
/// ```text
/// normalize_prefix("/api/blob/") → "/api/blob"
/// normalize_prefix("/")          → ""
/// normalize_prefix("api")        → Err("must start with '/'")
/// ```
pub fn normalize_prefix(prefix: &str) -> Result<String> {
    if !prefix.starts_with('/') {
        return Err(Error::ConfigParse(format!(
            "server.route_prefix must start with '/': '{}'",
            prefix
        )));
    }
    if prefix.contains(['{', '}', '*']) {
        return Err(Error::ConfigParse(format!(
            "server.route_prefix must not contain route parameters: '{}'",
            prefix
        )));
    }
    Ok(prefix.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.server.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.server.route_prefix, "/api/blob");
        assert_eq!(config.resolver.timeout, Duration::from_secs(30));
        assert_eq!(
            config.store,
            StoreConfig::Azure {
                connection_string_env: "AZURE_STORAGE_CONNECTION_STRING".to_string()
            }
        );
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(parse_config_str("").unwrap(), RelayConfig::default());
    }

    #[test]
    fn test_parse_s3_config() {
        let toml = r#"
[server]
bind = "0.0.0.0:9000"
route_prefix = "/assets/"

[resolver]
timeout_secs = 5

[store]
backend = "s3"
endpoint_url = "http://localhost:9001"
region = "auto"
force_path_style = true
        "#;

        let config = parse_config_str(toml).unwrap();
        assert_eq!(config.server.bind.port(), 9000);
        assert_eq!(config.server.route_prefix, "/assets");
        assert_eq!(config.resolver.timeout, Duration::from_secs(5));
        assert_eq!(config.store.backend_name(), "s3");
        assert_eq!(
            config.store,
            StoreConfig::S3 {
                endpoint_url: Some("http://localhost:9001".to_string()),
                region: Some("auto".to_string()),
                force_path_style: true,
            }
        );
    }

    #[test]
    fn test_parse_fs_config() {
        let toml = r#"
[store]
backend = "fs"
root = "./blobs"
        "#;

        let config = parse_config_str(toml).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Fs {
                root: PathBuf::from("./blobs")
            }
        );
    }

    #[test]
    fn test_fs_requires_root() {
        let result = parse_config_str("[store]\nbackend = \"fs\"\n");
        assert!(result.unwrap_err().to_string().contains("store.root"));

        let result = parse_config_str("[store]\nbackend = \"fs\"\nroot = \"  \"\n");
        assert!(result.unwrap_err().to_string().contains("Empty path"));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let result = parse_config_str("[store]\nbackend = \"ftp\"\n");
        assert!(result.unwrap_err().to_string().contains("Unknown store.backend"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = parse_config_str("[resolver]\ntimeout_secs = 0\n");
        assert!(result.unwrap_err().to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_rejects_bad_bind() {
        let result = parse_config_str("[server]\nbind = \"localhost\"\n");
        assert!(result.unwrap_err().to_string().contains("server.bind"));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let result = parse_config_str("[store]\naccount_key = \"secret\"\n");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/api/blob").unwrap(), "/api/blob");
        assert_eq!(normalize_prefix("/api/blob/").unwrap(), "/api/blob");
        assert_eq!(normalize_prefix("/").unwrap(), "");
        assert!(normalize_prefix("api/blob").is_err());
        assert!(normalize_prefix("/api/{container}").is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let config = parse_config_str(include_str!("../../../relay.example.toml")).unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_parse_config_missing_file() {
        let result = parse_config("/nonexistent/relay.toml");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
