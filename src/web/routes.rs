//! HTTP routes for the dashboard page and its JSON figures

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::AppState;
use crate::charts::{self, Figure, StatusClass};
use crate::client::{GroupBy, QueryWindow};
use crate::store::{AddressCount, DateRange, EventTable, UriCount};

/// Serve the dashboard page
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// Date-range picker bounds, as sent by the page ("YYYY-MM-DD" or a full
/// timestamp); either may be absent
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeQuery {
    fn to_range(&self) -> DateRange {
        DateRange::parse(self.start.as_deref(), self.end.as_deref())
    }
}

/// One status-class chart (2xx/3xx/4xx/5xx) from the startup snapshot
pub async fn api_status_chart(
    State(state): State<Arc<AppState>>,
    Path(class): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Figure>, (StatusCode, Json<Value>)> {
    let class = StatusClass::from_slug(&class).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown status class '{class}'") })),
        )
    })?;
    let counts = state.table.status_counts(&query.to_range());
    Ok(Json(charts::status_class_figure(&counts, class)))
}

/// 429/444/200 comparison chart from the startup snapshot
pub async fn api_comparison_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Json<Figure> {
    let counts = state.table.status_counts(&query.to_range());
    Json(charts::comparison_figure(&counts))
}

/// Request-time comparison chart from the startup snapshot
pub async fn api_request_time_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Json<Figure> {
    let series = state.table.request_time_series(&query.to_range());
    Json(charts::request_time_figure(&series))
}

/// Upstream status chart. Unlike the others this refetches a fresh rolling
/// window from the API on every call.
pub async fn api_upstream_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Figure>, (StatusCode, Json<Value>)> {
    let window = QueryWindow::last_days(state.dashboard.days_to_retrieve);
    let events = state
        .client
        .fetch_events(&window, GroupBy::NoRemoteAddress)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Upstream status refetch failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    let table = EventTable::from_events(events);
    let counts = table.upstream_status_counts(&query.to_range());
    Ok(Json(charts::upstream_figure(&counts)))
}

/// Ranked table of remote addresses by summed occurrence count
pub async fn api_top_remote_addresses(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<AddressCount>> {
    Json(state.table.top_remote_addresses(state.dashboard.top_n))
}

/// Ranked table of request URIs by summed occurrence count
pub async fn api_top_request_uris(State(state): State<Arc<AppState>>) -> Json<Vec<UriCount>> {
    Json(state.table.top_request_uris(state.dashboard.top_n))
}
