//! ==============================================================================
//! server.rs - dashboard web server
//! ==============================================================================
//!
//! routes:
//!     GET  /              fetch now, then the static dashboard page
//!                         (templates/dashboard.html)
//!     GET  /api           held store as json
//!     GET  /api/charts    six chart series as json
//!     POST /api/refresh   fetch now, replace the store, return it
//!
//! every page load is a new viewing session and gets fresh data, so `/`
//! refreshes the store before answering. the page itself carries no data;
//! it pulls /api/charts after load and after each refresh. nothing in here
//! knows about feed parsing.
//!
//! ==============================================================================

use anyhow::Result;
use axum::{
    extract::State,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::chart::ChartsView;
use crate::feed::FeedClient;
use crate::store::{self, MeasurementStore, SharedStore};

const DASHBOARD_HTML: &str = include_str!("../templates/dashboard.html");

/// handles shared by every request
#[derive(Clone)]
pub struct WebState {
    pub store: SharedStore,
    pub client: Arc<FeedClient>,
    pub show_rows: bool,
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api", get(api_handler))
        .route("/api/charts", get(charts_handler))
        .route("/api/refresh", post(refresh_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(bind: &str, state: WebState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("dashboard live at http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn dashboard_handler(State(state): State<WebState>) -> Html<&'static str> {
    store::refresh(&state.store, &state.client, state.show_rows).await;
    Html(DASHBOARD_HTML)
}

/// json api endpoint for programmatic access
async fn api_handler(State(state): State<WebState>) -> Json<MeasurementStore> {
    let held = state.store.read().await;
    Json(held.clone())
}

async fn charts_handler(State(state): State<WebState>) -> Json<ChartsView> {
    let held = state.store.read().await;
    Json(ChartsView::from_store(&held))
}

/// manual refresh: blocks on the feed, then answers with the new store
async fn refresh_handler(State(state): State<WebState>) -> Json<MeasurementStore> {
    tracing::info!("manual refresh requested");
    Json(store::refresh(&state.store, &state.client, state.show_rows).await)
}
