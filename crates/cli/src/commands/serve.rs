use anyhow::{Context, Result};
use asset_relay_core::{
    AssetRequest, EXPECTED_FORMAT, Error, ObjectStore, RelayConfig, ResolvedAsset, Resolver,
    assemble_headers, cors_headers,
};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

#[derive(Clone)]
struct AppState {
    resolver: Resolver<dyn ObjectStore>,
}

/// Start the asset server.
///
/// This command:
/// - Connects the configured object store
/// - Serves `GET`/`HEAD`/`OPTIONS` on `<prefix>/<container>/<path>`
/// - Runs until Ctrl+C
pub async fn run(config: RelayConfig) -> Result<()> {
    println!("📦 Starting asset relay...");
    println!("   Store: {}", config.store.backend_name());
    println!("   Timeout: {:?}", config.resolver.timeout);

    let store = asset_relay_store::connect(&config.store)
        .await
        .context("Failed to connect to object store")?;

    let app = router(store, &config);

    let addr = config.server.bind;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!(
        "\n🚀 Serving assets at: http://{}{}/<container>/<path>",
        addr, config.server.route_prefix
    );
    println!("   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// Build the router for a store and configuration.
fn router(store: Arc<dyn ObjectStore>, config: &RelayConfig) -> Router {
    let state = AppState {
        resolver: Resolver::new(store, config.resolver.timeout),
    };
    let prefix = config.server.route_prefix.as_str();

    let mut app: Router<AppState> = Router::new()
        .route("/healthz", get(health_handler))
        .route(
            &format!("{prefix}/{{*path}}"),
            get(asset_handler).options(preflight_handler),
        );

    // Requests that stop at the prefix carry no container or path.
    if prefix.is_empty() {
        app = app.route("/", get(missing_path_handler).options(preflight_handler));
    } else {
        app = app
            .route(prefix, get(missing_path_handler).options(preflight_handler))
            .route(
                &format!("{prefix}/"),
                get(missing_path_handler).options(preflight_handler),
            );
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Resolve and stream one asset. `HEAD` is served by the same handler
/// with the body stripped.
async fn asset_handler(State(state): State<AppState>, Path(tail): Path<String>) -> Response {
    let request = match AssetRequest::from_url_path(&tail) {
        Ok(request) => request,
        Err(err) => return error_response(&err),
    };

    match state.resolver.resolve(&request).await {
        Ok(asset) => {
            info!(
                container = request.container(),
                path = request.path(),
                physical = %asset.physical_path,
                compressed = asset.is_compressed,
                bytes = asset.size_bytes(),
                "serving asset"
            );
            asset_response(asset)
        }
        Err(err) => error_response(&err),
    }
}

async fn missing_path_handler() -> Response {
    error_response(&Error::InvalidRequest(EXPECTED_FORMAT.to_string()))
}

async fn preflight_handler() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, cors_headers())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "store": state.resolver.store().name(),
    }))
}

fn asset_response(asset: ResolvedAsset) -> Response {
    let headers = assemble_headers(&asset);
    (StatusCode::OK, headers, Body::from(asset.payload)).into_response()
}

/// Map a resolution failure to its status code and JSON body.
fn error_response(err: &Error) -> Response {
    let (status, body) = match err {
        Error::InvalidRequest(message) => {
            debug!(error = %message, "rejected request");
            (StatusCode::BAD_REQUEST, json!({ "error": message }))
        }
        Error::NotFound { .. } => {
            debug!(error = %err, "asset not found");
            (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
        }
        _ => {
            warn!(error = %err, retryable = err.is_retryable(), "asset retrieval failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Failed to retrieve asset",
                    "details": err.to_string(),
                }),
            )
        }
    };
    (status, cors_headers(), Json(body)).into_response()
}
