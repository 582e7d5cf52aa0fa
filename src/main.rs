//! ==============================================================================
//! main.rs - air quality hub entry point
//! ==============================================================================
//!
//! purpose:
//!     receives comma-separated readings from an indoor air quality sensor
//!     (particles, PM2.5, formaldehyde, CO2, temperature, humidity, VOC and
//!     a sequence counter), stores them, and serves analytics to the dashboard.
//!
//! responsibilities:
//!     - load configuration (config/airsense.toml or defaults)
//!     - initialize tracing
//!     - open the configured reading store (sqlite or memory)
//!     - restore the sequence watermark and build the service
//!     - serve the json api + dashboard until ctrl-c
//!
//! relationships:
//!     - uses: config.rs, store/, service.rs, server.rs
//!
//! architecture:
//!
//!     ┌──────────────┐  POST /api/data   ┌──────────────────────────────────┐
//!     │ sensor board │ ────────────────▶ │            rust hub              │
//!     └──────────────┘                   │  ┌────────┐   ┌───────────────┐  │
//!                                        │  │ server │──▶│    service    │  │
//!     ┌──────────────┐  GET /api/*       │  └────────┘   │ validator     │  │
//!     │  dashboard   │ ◀──────────────── │               │ analysis      │  │
//!     └──────────────┘                   │               └───────┬───────┘  │
//!                                        │                       ▼          │
//!                                        │               ┌───────────────┐  │
//!                                        │               │ ReadingStore  │  │
//!                                        │               │ sqlite|memory │  │
//!                                        │               └───────────────┘  │
//!                                        └──────────────────────────────────┘
//!
//! ==============================================================================

mod analysis;
mod config;
mod domain;
mod error;
mod server;
mod service;
mod store;
mod validator;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigSource, HubConfig, StorageBackend};
use crate::service::SensorService;
use crate::store::{MemoryStore, ReadingStore, SqliteStore};

// ==============================================================================
// main entry point
// ==============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // step 1: load configuration
    let (config, source) = HubConfig::load_or_default();

    // step 2: initialize tracing (RUST_LOG wins over the config file)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("===========================================================");
    tracing::info!("  AirSense Hub - indoor air quality monitor");
    tracing::info!("===========================================================");

    match &source {
        ConfigSource::File(path) => tracing::info!("[CONFIG] Loaded from {}", path.display()),
        ConfigSource::Defaults => tracing::info!("[CONFIG] No config file found, using defaults"),
        ConfigSource::Rejected { path, error } => tracing::warn!(
            "[CONFIG] Ignoring {} ({}), using defaults",
            path.display(),
            error
        ),
    }
    config.log_summary();

    // step 3: open the reading store
    let store: Arc<dyn ReadingStore> = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(
            SqliteStore::connect(&config.storage.database_url, config.storage.max_connections)
                .await
                .with_context(|| format!("failed to open {}", config.storage.database_url))?,
        ),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::info!("[STARTUP] ✓ Store ready");

    // step 4: build the service (restores the sequence watermark)
    let service = SensorService::open(
        store,
        config.analysis.default_hours,
        config.logging.show_sensor_data,
    )
    .await
    .context("failed to restore sequence watermark")?;

    // step 5: serve until ctrl-c
    server::run_server(service, &config.server.bind, &config.server.static_dir).await?;

    tracing::info!("[SHUTDOWN] Bye");
    Ok(())
}
