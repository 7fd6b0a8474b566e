pub mod check_config;
pub mod probe;
pub mod resolve;
pub mod serve;

use anyhow::{Context, Result};
use asset_relay_core::{RelayConfig, parse_config};
use std::path::Path;

/// Load relay.toml, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file does not exist: {}", path.display());
            }
            parse_config(path).with_context(|| format!("Failed to parse {}", path.display()))
        }
        None => Ok(RelayConfig::default()),
    }
}
