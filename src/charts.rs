//! Plotly figure descriptions
//!
//! Each builder is a stateless mapping from pre-aggregated rows to a
//! `{"data": [...], "layout": {...}}` object the browser hands straight to
//! Plotly.newPlot. Bar traces only; the page styling matches the darkgray
//! paper / lightgray plot scheme throughout.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::{RequestTimePoint, StatusCount};

const PAPER_BGCOLOR: &str = "darkgray";
const PLOT_BGCOLOR: &str = "lightgray";

/// The status classes the dashboard charts, with their fixed colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Informational,
    Success,
    Redirect,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// Parse a path segment like "2xx"
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "1xx" => Some(Self::Informational),
            "2xx" => Some(Self::Success),
            "3xx" => Some(Self::Redirect),
            "4xx" => Some(Self::ClientError),
            "5xx" => Some(Self::ServerError),
            _ => None,
        }
    }

    pub fn range(self) -> (u16, u16) {
        match self {
            Self::Informational => (100, 199),
            Self::Success => (200, 299),
            Self::Redirect => (300, 399),
            Self::ClientError => (400, 499),
            Self::ServerError => (500, 599),
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Informational => "gray",
            Self::Success => "green",
            Self::Redirect => "blue",
            Self::ClientError => "yellow",
            Self::ServerError => "red",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Informational => "Status 1XX",
            Self::Success => "Status 2XX",
            Self::Redirect => "Status 3XX",
            Self::ClientError => "Status 4XX",
            Self::ServerError => "Status 5XX",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub paper_bgcolor: &'static str,
    pub plot_bgcolor: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: &'static str,
}

impl Layout {
    fn timestamp_count(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            xaxis: Axis { title: "Timestamp" },
            yaxis: Axis { title: "Count" },
            paper_bgcolor: PAPER_BGCOLOR,
            plot_bgcolor: PLOT_BGCOLOR,
        }
    }
}

fn fmt_minute(minute: DateTime<Utc>) -> String {
    minute.format("%Y-%m-%d %H:%M").to_string()
}

/// One bar trace per distinct status found in `counts`
fn status_traces<F>(counts: &[StatusCount], name: F, color: Option<&'static str>) -> Vec<Trace>
where
    F: Fn(u16) -> String,
{
    let mut statuses: Vec<u16> = counts.iter().map(|c| c.status).collect();
    statuses.sort_unstable();
    statuses.dedup();

    statuses
        .into_iter()
        .map(|status| {
            let rows = counts.iter().filter(|c| c.status == status);
            let (x, y) = rows
                .map(|c| (fmt_minute(c.minute), c.count as f64))
                .unzip();
            Trace {
                x,
                y,
                kind: "bar",
                name: name(status),
                marker: color.map(|color| Marker { color }),
            }
        })
        .collect()
}

/// Bar chart of one status class, all traces in the class color
pub fn status_class_figure(counts: &[StatusCount], class: StatusClass) -> Figure {
    let (low, high) = class.range();
    let in_class: Vec<StatusCount> = counts
        .iter()
        .filter(|c| c.status >= low && c.status <= high)
        .cloned()
        .collect();
    Figure {
        data: status_traces(&in_class, |s| s.to_string(), Some(class.color())),
        layout: Layout::timestamp_count(class.title()),
    }
}

/// Rate-limit / connection-close traffic against the 200 baseline
pub const COMPARISON_STATUSES: [u16; 3] = [429, 444, 200];

pub fn comparison_figure(counts: &[StatusCount]) -> Figure {
    let data = COMPARISON_STATUSES
        .iter()
        .map(|&status| {
            let rows = counts.iter().filter(|c| c.status == status);
            let (x, y) = rows
                .map(|c| (fmt_minute(c.minute), c.count as f64))
                .unzip();
            Trace {
                x,
                y,
                kind: "bar",
                name: status.to_string(),
                marker: None,
            }
        })
        .collect();
    Figure {
        data,
        layout: Layout::timestamp_count("429 / 444 / 200 comparison"),
    }
}

/// One trace per distinct upstream status
pub fn upstream_figure(counts: &[StatusCount]) -> Figure {
    Figure {
        data: status_traces(counts, |s| format!("Status: {s}"), None),
        layout: Layout::timestamp_count("Upstream status counts by timestamp"),
    }
}

/// requestTime against upstreamResponseTime, per minute
pub fn request_time_figure(points: &[RequestTimePoint]) -> Figure {
    let x: Vec<String> = points.iter().map(|p| fmt_minute(p.minute)).collect();
    let data = vec![
        Trace {
            x: x.clone(),
            y: points.iter().map(|p| p.request_time).collect(),
            kind: "bar",
            name: "requestTime".to_string(),
            marker: None,
        },
        Trace {
            x,
            y: points.iter().map(|p| p.upstream_response_time).collect(),
            kind: "bar",
            name: "upstreamResponseTime".to_string(),
            marker: None,
        },
    ];
    Figure {
        data,
        layout: Layout {
            title: "Request time comparison".to_string(),
            xaxis: Axis { title: "Timestamp" },
            yaxis: Axis { title: "Seconds" },
            paper_bgcolor: PAPER_BGCOLOR,
            plot_bgcolor: PLOT_BGCOLOR,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(raw: &str, status: u16, count: i64) -> StatusCount {
        StatusCount {
            minute: chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .unwrap()
                .and_utc(),
            status,
            count,
        }
    }

    #[test]
    fn class_figure_has_one_trace_per_status() {
        let counts = vec![
            count("2026-08-01T10:00:00", 200, 5),
            count("2026-08-01T10:01:00", 200, 2),
            count("2026-08-01T10:00:00", 204, 1),
            count("2026-08-01T10:00:00", 404, 9),
        ];
        let figure = status_class_figure(&counts, StatusClass::Success);
        assert_eq!(figure.data.len(), 2);
        assert_eq!(figure.data[0].name, "200");
        assert_eq!(figure.data[0].y, vec![5.0, 2.0]);
        assert_eq!(figure.data[1].name, "204");
    }

    #[test]
    fn class_figure_applies_class_color_and_title() {
        let counts = vec![count("2026-08-01T10:00:00", 503, 1)];
        let figure = status_class_figure(&counts, StatusClass::ServerError);
        assert_eq!(figure.layout.title, "Status 5XX");
        assert_eq!(figure.data[0].marker.as_ref().unwrap().color, "red");
    }

    #[test]
    fn comparison_figure_keeps_fixed_trace_order() {
        let counts = vec![
            count("2026-08-01T10:00:00", 200, 50),
            count("2026-08-01T10:00:00", 429, 3),
        ];
        let figure = comparison_figure(&counts);
        assert_eq!(figure.data.len(), 3);
        assert_eq!(figure.data[0].name, "429");
        assert_eq!(figure.data[1].name, "444");
        assert!(figure.data[1].y.is_empty());
        assert_eq!(figure.data[2].name, "200");
    }

    #[test]
    fn upstream_traces_are_labeled_with_prefix() {
        let counts = vec![count("2026-08-01T10:00:00", 502, 2)];
        let figure = upstream_figure(&counts);
        assert_eq!(figure.data[0].name, "Status: 502");
        assert!(figure.data[0].marker.is_none());
    }

    #[test]
    fn figures_serialize_as_plotly_objects() {
        let counts = vec![count("2026-08-01T10:00:00", 200, 1)];
        let value =
            serde_json::to_value(status_class_figure(&counts, StatusClass::Success)).unwrap();
        assert_eq!(value["data"][0]["type"], "bar");
        assert_eq!(value["data"][0]["x"][0], "2026-08-01 10:00");
        assert_eq!(value["layout"]["paper_bgcolor"], "darkgray");
        assert_eq!(value["layout"]["plot_bgcolor"], "lightgray");
    }

    #[test]
    fn slugs_map_to_classes() {
        assert_eq!(StatusClass::from_slug("2xx"), Some(StatusClass::Success));
        assert_eq!(StatusClass::from_slug("5xx"), Some(StatusClass::ServerError));
        assert_eq!(StatusClass::from_slug("6xx"), None);
    }
}
