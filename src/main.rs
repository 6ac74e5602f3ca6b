//! httplog-dash - A web dashboard for HTTP event logs
//!
//! Fetches a rolling 30-day window of HTTP events from a GraphQL analytics
//! API and serves them as:
//! - Per-minute bar charts by status class (2xx/3xx/4xx/5xx)
//! - A 429/444/200 comparison chart and an upstream status chart
//! - Request-time series and top remote address / request URI tables

mod charts;
mod client;
mod config;
mod store;
mod web;

use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    // Initialize logging based on LOG_FORMAT env var
    // Use LOG_FORMAT=gcp for structured GCP Cloud Logging
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "gcp" {
        tracing_subscriber::registry()
            .with(tracing_subscriber::filter::LevelFilter::INFO)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .init();
    }

    info!("Starting httplog-dash...");

    // Load configuration (resolves the API token from env, file or prompt)
    let config = config::Config::load()?;
    info!("Configuration loaded");

    let client = client::ApiClient::new(&config.api)?.with_limit(config.dashboard.limit);

    // One fetch at startup; the snapshot backs every chart except the
    // upstream status one, which refetches per request
    let window = client::QueryWindow::last_days(config.dashboard.days_to_retrieve);
    info!(begin = %window.begin_str(), end = %window.end_str(), "Fetching HTTP events");
    let events = client
        .fetch_events(&window, client::GroupBy::Full)
        .await
        .context("initial httpEvents fetch")?;
    info!(rows = events.len(), "HTTP events fetched");

    let table = store::EventTable::from_events(events);
    info!(rows = table.len(), "Event table built");

    // Start web server (blocking)
    web::start_server(&config, table, client).await?;

    Ok(())
}
