use anyhow::{Context, Result};
use asset_relay_core::{AssetRequest, ObjectStore, RelayConfig, ResolvedAsset, Resolver};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve one asset the way the server would and print the outcome.
pub async fn run(
    config: RelayConfig,
    container: String,
    path: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let request = AssetRequest::new(container, path)?;

    println!("🔎 Resolving {}/{}", request.container(), request.path());
    println!("   Store: {}", config.store.backend_name());

    let store = asset_relay_store::connect(&config.store)
        .await
        .context("Failed to connect to object store")?;
    let resolver = Resolver::new(store, config.resolver.timeout);

    let asset = resolve_to(&resolver, &request, output.as_deref()).await?;
    print_asset(&asset);
    if let Some(output) = output {
        println!("   ✓ Wrote payload to {}", output.display());
    }

    Ok(())
}

async fn resolve_to(
    resolver: &Resolver<dyn ObjectStore>,
    request: &AssetRequest,
    output: Option<&Path>,
) -> Result<ResolvedAsset> {
    let asset = resolver.resolve(request).await?;
    if let Some(output) = output {
        fs::write(output, &asset.payload)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }
    Ok(asset)
}

fn print_asset(asset: &ResolvedAsset) {
    println!("   ✓ Physical path: {}", asset.physical_path);
    println!("   ✓ Content-Type: {}", asset.content_type);
    println!(
        "   ✓ Content-Encoding: {}",
        if asset.is_compressed { "gzip" } else { "(none)" }
    );
    println!("   ✓ Size: {} bytes", asset.size_bytes());
}
