//! Main Entrypoint for the Cadence Voice Agent
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Starting the liveness responder on its own thread.
//! 3. Prewarming the voice catalog.
//! 4. Serving gateway sessions until shutdown.

use anyhow::Context;
use cadence_agent::{
    catalog_loader::CatalogLoader, config::Config, liveness::LivenessResponder,
    router::create_router, state::AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded.");

    // --- 3. Liveness Responder ---
    let liveness = LivenessResponder::bind(config.liveness_address).with_context(|| {
        format!(
            "Failed to bind health server on {}",
            config.liveness_address
        )
    })?;
    liveness
        .spawn()
        .context("Failed to start health server thread")?;

    // --- 4. Prewarm Voice Catalog ---
    let catalog = Arc::new(
        CatalogLoader::new(config.voice_provider.clone())
            .load()
            .await,
    );
    info!(voices = catalog.len(), "Voice catalog ready.");

    let app_state = Arc::new(AppState {
        catalog,
        config: Arc::new(config.clone()),
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        bind_address = %config.bind_address,
        tts_model = %config.pipeline.tts_model,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
