//! Web server module

mod routes;

use anyhow::Result;
use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::client::ApiClient;
use crate::config::{Config, DashboardConfig};
use crate::store::EventTable;

pub struct AppState {
    /// Snapshot fetched once at startup; read-only afterwards
    pub table: EventTable,
    pub client: ApiClient,
    pub dashboard: DashboardConfig,
}

pub async fn start_server(config: &Config, table: EventTable, client: ApiClient) -> Result<()> {
    let state = Arc::new(AppState {
        table,
        client,
        dashboard: config.dashboard.clone(),
    });

    let app = Router::new()
        // Dashboard page
        .route("/", get(routes::index))
        // Chart figures (each one the counterpart of a date-picker callback)
        .route("/api/charts/status/:class", get(routes::api_status_chart))
        .route("/api/charts/comparison", get(routes::api_comparison_chart))
        .route("/api/charts/upstream", get(routes::api_upstream_chart))
        .route("/api/charts/request-time", get(routes::api_request_time_chart))
        // Ranked tables
        .route("/api/top/remote-addresses", get(routes::api_top_remote_addresses))
        .route("/api/top/request-uris", get(routes::api_top_request_uris))
        // Static assets
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Web server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
