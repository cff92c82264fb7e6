//! Server initialization and main run loop

use super::loader::load_config;
use anyhow::{Context, Result};
use chartographer_core::{BmpCodec, CanvasService};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Run the server, storing canvases in `data_dir` if given
pub async fn run(data_dir: Option<&Path>) -> Result<()> {
    info!(
        "Starting Chartographer v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded");

    let data_dir = config.storage.resolve_data_dir(data_dir)?;
    info!("Data directory: {}", data_dir.display());

    let codec = BmpCodec::with_max_pixels(config.storage.max_canvas_pixels);
    let service = CanvasService::with_codec(&data_dir, Arc::new(codec))
        .context("Failed to open canvas store")?;
    let existing = service
        .store()
        .ids()
        .context("Failed to list canvas directory")?
        .len();
    info!(
        canvases = existing,
        max_canvas_pixels = config.storage.max_canvas_pixels,
        "Canvas store initialized"
    );

    let app = crate::api::api_router(Arc::new(service), config.server.max_body_bytes);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Chartographer shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
