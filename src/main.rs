//! slot-booking server entry point.
//!
//! Loads configuration, opens the storage backend, and serves the REST API.

use slot_booking::api;
use slot_booking::app_state::AppState;
use slot_booking::config::ServiceConfig;
use slot_booking::storage::Storage;
use slot_booking::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServiceConfig::from_env()?;
    telemetry::init(config.log_format)?;
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.storage_backend,
        "starting slot-booking"
    );

    // Build storage and service layers
    let storage = Storage::open(&config).await?;
    let app_state = AppState::new(&storage);

    // Build router
    let app = api::build_app(app_state, &config);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
