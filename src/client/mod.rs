//! GraphQL client for the httpEvents analytics API

mod de;
mod query;

pub use query::GroupBy;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::config::ApiConfig;

/// Timestamp format the API expects in tsRange bounds
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to events API failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("events API returned status {0}")]
    Http(reqwest::StatusCode),
    #[error("GraphQL errors: {0}")]
    GraphQl(String),
    #[error("events API response has no data")]
    MissingData,
}

/// Time bounds interpolated into the httpEvents query
#[derive(Debug, Clone, Copy)]
pub struct QueryWindow {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// Rolling window ending now
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        Self {
            begin: end - Duration::days(days),
            end,
        }
    }

    pub fn begin_str(&self) -> String {
        self.begin.format(TS_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(TS_FORMAT).to_string()
    }
}

/// One row of the httpEvents response. The API serializes some numeric
/// fields as strings, so deserialization accepts both shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpEvent {
    pub ts: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub request_uri: String,
    #[serde(deserialize_with = "de::num_or_str")]
    pub status: u16,
    #[serde(default, deserialize_with = "de::opt_num_or_str")]
    pub upstream_status: Option<u16>,
    #[serde(default, deserialize_with = "de::opt_num_or_str")]
    pub request_time: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_num_or_str")]
    pub upstream_response_time: Option<f64>,
    #[serde(default)]
    pub remote_address: Option<String>,
    #[serde(deserialize_with = "de::num_or_str")]
    pub count: i64,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpEventsData {
    http_events: Vec<HttpEvent>,
}

#[derive(Clone)]
pub struct ApiClient {
    endpoint: Url,
    token: String,
    limit: u32,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()?;

        Ok(Self {
            endpoint,
            token: config.token.clone(),
            limit: 10000,
            client,
        })
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// POST the EventsQuery document and unwrap data.httpEvents
    pub async fn fetch_events(
        &self,
        window: &QueryWindow,
        group_by: GroupBy,
    ) -> Result<Vec<HttpEvent>, ApiError> {
        let document = query::events_document(window, group_by, self.limit);
        let body = serde_json::json!({ "query": document });

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Authorization", format!("Token {}", self.token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http(status));
        }

        let payload: GraphQlResponse<HttpEventsData> = response.json().await?;

        if let Some(errors) = payload.errors {
            let messages = errors
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join(", ");
            warn!(errors = %messages, "httpEvents query returned errors");
            return Err(ApiError::GraphQl(messages));
        }

        payload
            .data
            .map(|d| d.http_events)
            .ok_or(ApiError::MissingData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_spans_requested_days() {
        let window = QueryWindow::last_days(30);
        assert_eq!(window.end - window.begin, Duration::days(30));
    }

    #[test]
    fn window_bounds_format_without_zone() {
        let window = QueryWindow {
            begin: DateTime::parse_from_rfc3339("2026-07-28T09:15:00Z")
                .unwrap()
                .with_timezone(&Utc),
            end: DateTime::parse_from_rfc3339("2026-08-27T09:15:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        assert_eq!(window.begin_str(), "2026-07-28T09:15:00");
        assert_eq!(window.end_str(), "2026-08-27T09:15:00");
    }

    #[test]
    fn event_deserializes_numeric_fields_from_strings() {
        let event: HttpEvent = serde_json::from_str(
            r#"{
                "ts": "2026-08-01T10:00:00",
                "host": "example.com",
                "requestUri": "/index.html",
                "status": "200",
                "upstreamStatus": "502",
                "requestTime": "0.123",
                "upstreamResponseTime": 0.1,
                "remoteAddress": "203.0.113.9",
                "count": "42"
            }"#,
        )
        .unwrap();
        assert_eq!(event.status, 200);
        assert_eq!(event.upstream_status, Some(502));
        assert_eq!(event.request_time, Some(0.123));
        assert_eq!(event.count, 42);
    }

    #[test]
    fn event_tolerates_missing_optional_fields() {
        let event: HttpEvent = serde_json::from_str(
            r#"{
                "ts": "2026-08-01T10:00:00",
                "host": "example.com",
                "requestUri": "/",
                "status": 404,
                "count": 1
            }"#,
        )
        .unwrap();
        assert_eq!(event.upstream_status, None);
        assert_eq!(event.remote_address, None);
    }

    #[test]
    fn response_errors_are_collected() {
        let payload: GraphQlResponse<HttpEventsData> = serde_json::from_str(
            r#"{"data": null, "errors": [{"message": "unauthorized"}]}"#,
        )
        .unwrap();
        let errors = payload.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unauthorized");
    }
}
