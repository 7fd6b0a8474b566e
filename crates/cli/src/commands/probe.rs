use anyhow::{Context, Result};
use asset_relay_core::{
    AssetRequest, FallbackDecision, ObjectStore, RelayConfig, Resolver, build_file_paths,
};

/// Existence check for one build file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFileStatus {
    pub path: String,
    pub decision: FallbackDecision,
}

/// Check the loader, data, framework and code files of a WebGL build,
/// the same four files a browser loader requests before starting.
pub async fn run(config: RelayConfig, container: String, build_id: String) -> Result<()> {
    println!("🧪 Probing build '{}' in container '{}'", build_id, container);

    let store = asset_relay_store::connect(&config.store)
        .await
        .context("Failed to connect to object store")?;
    let resolver = Resolver::new(store, config.resolver.timeout);

    let statuses = probe_build(&resolver, &container, &build_id).await?;

    let mut missing = 0;
    for status in &statuses {
        match status.decision {
            FallbackDecision::Plain => println!("   ✓ {} (plain)", status.path),
            FallbackDecision::Compressed => println!("   ✓ {} (gzip)", status.path),
            FallbackDecision::NotFound => {
                println!("   ✗ {} (missing)", status.path);
                missing += 1;
            }
        }
    }

    if missing > 0 {
        anyhow::bail!(
            "{} of {} build files missing for '{}'",
            missing,
            statuses.len(),
            build_id
        );
    }

    println!("\n✅ Build '{}' is complete", build_id);
    Ok(())
}

pub async fn probe_build(
    resolver: &Resolver<dyn ObjectStore>,
    container: &str,
    build_id: &str,
) -> Result<Vec<BuildFileStatus>> {
    let mut statuses = Vec::new();
    for path in build_file_paths(build_id) {
        let request = AssetRequest::new(container, path.as_str())?;
        let decision = resolver
            .probe(&request)
            .await
            .with_context(|| format!("Failed to probe {}/{}", container, path))?;
        statuses.push(BuildFileStatus { path, decision });
    }
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_relay_core::MemoryStore;
    use asset_relay_core::store::StoreCall;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_probe_build_reports_each_file() {
        let store = Arc::new(
            MemoryStore::new()
                .with_object("demo", "Build/app.loader.js", vec![0u8])
                .with_object("demo", "Build/app.data.gz", vec![0u8])
                .with_object("demo", "Build/app.wasm.gz", vec![0u8]),
        );
        let resolver: Resolver<dyn ObjectStore> =
            Resolver::new(store.clone(), Duration::from_secs(1));

        let statuses = probe_build(&resolver, "demo", "Build/app").await.unwrap();
        let decisions: Vec<_> = statuses
            .iter()
            .map(|s| (s.path.as_str(), s.decision))
            .collect();
        assert_eq!(
            decisions,
            vec![
                ("Build/app.loader.js", FallbackDecision::Plain),
                ("Build/app.data", FallbackDecision::Compressed),
                ("Build/app.framework.js", FallbackDecision::NotFound),
                ("Build/app.wasm", FallbackDecision::Compressed),
            ]
        );
        assert!(
            store
                .calls()
                .iter()
                .all(|call| matches!(call, StoreCall::Exists { .. }))
        );
    }

    #[tokio::test]
    async fn test_probe_build_rejects_traversal() {
        let resolver: Resolver<dyn ObjectStore> =
            Resolver::new(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        assert!(probe_build(&resolver, "demo", "../app").await.is_err());
    }
}
