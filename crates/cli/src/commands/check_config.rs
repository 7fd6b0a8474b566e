use super::load_config;
use anyhow::Result;
use asset_relay_core::StoreConfig;
use std::path::PathBuf;

pub async fn run(path: Option<PathBuf>) -> Result<()> {
    match &path {
        Some(path) => println!("Checking configuration at: {}", path.display()),
        None => println!("No config file given, checking defaults"),
    }

    let config = load_config(path.as_deref())?;

    println!("✓ configuration valid");
    println!("  Bind: {}", config.server.bind);
    println!(
        "  Route: {}/<container>/<path>",
        config.server.route_prefix
    );
    println!("  Timeout: {:?}", config.resolver.timeout);
    match &config.store {
        StoreConfig::Azure {
            connection_string_env,
        } => {
            let set = std::env::var_os(connection_string_env).is_some();
            println!(
                "  Store: azure (connection string from {}{})",
                connection_string_env,
                if set { "" } else { ", currently unset" }
            );
        }
        StoreConfig::S3 {
            endpoint_url,
            region,
            force_path_style,
        } => {
            println!("  Store: s3");
            println!(
                "    Endpoint: {}",
                endpoint_url.as_deref().unwrap_or("(AWS default)")
            );
            println!("    Region: {}", region.as_deref().unwrap_or("(from environment)"));
            println!("    Path-style: {}", force_path_style);
        }
        StoreConfig::Fs { root } => println!("  Store: fs ({})", root.display()),
    }

    Ok(())
}
