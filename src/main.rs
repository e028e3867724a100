//! ==============================================================================
//! main.rs - air quality dashboard entry point
//! ==============================================================================
//!
//! purpose:
//!     polls a thingspeak channel (pm2.5, pm10, ozone, humidity, temperature,
//!     co), normalizes the latest entries and serves them as six line charts.
//!
//! responsibilities:
//!     - load dashboard.toml and set up logging
//!     - build the feed client and the held measurement store
//!     - run the initial fetch
//!     - optionally re-fetch on a timer (polling.interval_seconds > 0)
//!     - serve the dashboard page and json api
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────────┐
//!     │                     rust host (this file)                     │
//!     │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │
//!     │  │ initial load │   │ web server   │   │ refresh timer    │   │
//!     │  │              │   │ (port 3000)  │   │ (opt-in)         │   │
//!     │  └──────┬───────┘   └──────┬───────┘   └────────┬─────────┘   │
//!     │         └──────────────────┼────────────────────┘             │
//!     │                     ┌──────┴──────┐                           │
//!     │                     │ store.rs    │  Arc<RwLock<..>>          │
//!     │                     └──────┬──────┘                           │
//!     │                     ┌──────┴──────┐                           │
//!     │                     │ feed.rs     │ -> normalize.rs           │
//!     │                     └──────┬──────┘                           │
//!     └────────────────────────────┼──────────────────────────────────┘
//!                                  │ https GET ?results=5
//!                                  ▼
//!                     api.thingspeak.com/channels/1596152
//!
//! ==============================================================================

mod chart;
mod config;
mod domain;
mod error;
mod feed;
mod normalize;
mod server;
mod store;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::DashboardConfig;
use crate::feed::FeedClient;
use crate::server::WebState;
use crate::store::MeasurementStore;

#[tokio::main]
async fn main() -> Result<()> {
    // step 1: load configuration
    let (config, config_path) = DashboardConfig::load_or_default()?;

    // step 2: logging, RUST_LOG wins over the configured level
    init_tracing(&config.logging.level);
    match &config_path {
        Some(path) => tracing::info!("loaded config from {}", path.display()),
        None => tracing::warn!("no config file found, using defaults"),
    }
    config.log_summary();

    // step 3: feed client and held state
    let client = Arc::new(FeedClient::new(&config.feed, config.normalization.policy));
    tracing::info!(url = client.url(), "feed endpoint");
    let store = MeasurementStore::shared();
    let show_rows = config.logging.show_rows;

    // step 4: initial load
    store::refresh(&store, &client, show_rows).await;

    // step 5: scheduled refresh, only when asked for
    let interval = config.polling.interval_seconds;
    if interval > 0 {
        tracing::info!(interval_seconds = interval, "scheduled refresh enabled");
        store::spawn_scheduled_refresh(
            store.clone(),
            client.clone(),
            Duration::from_secs(interval),
            show_rows,
        );
    }

    // step 6: serve until shutdown
    let state = WebState { store, client, show_rows };
    server::run_server(&config.server.bind, state).await
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("airq_dashboard={level},tower_http={level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
