//! In-memory event table and its derived aggregates
//!
//! Rows are held as fetched; every view (grouped counts, ranked tables,
//! request-time series) is recomputed from scratch on each call. The
//! tables are small (the query is capped at 10000 rows) so there is no
//! incremental bookkeeping.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::client::HttpEvent;

/// Request-time values above this are clamped for charting
pub const REQUEST_TIME_CEILING: f64 = 120.0;

/// One fetched event with its timestamp rounded to the minute
#[derive(Debug, Clone)]
pub struct EventRow {
    pub minute: DateTime<Utc>,
    pub status: u16,
    pub upstream_status: Option<u16>,
    pub request_time: Option<f64>,
    pub upstream_response_time: Option<f64>,
    pub remote_address: Option<String>,
    pub request_uri: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub minute: DateTime<Utc>,
    pub status: u16,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCount {
    pub remote_address: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UriCount {
    pub request_uri: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTimePoint {
    pub minute: DateTime<Utc>,
    pub request_time: f64,
    pub upstream_response_time: f64,
}

/// Inclusive date-range filter from the dashboard's pickers. Bounds accept
/// either a bare date or a full timestamp; a missing bound is open.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: start.and_then(|s| parse_bound(s, false)),
            end: end.and_then(|s| parse_bound(s, true)),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// A bare date expands to the start or end of that day depending on which
/// bound it is.
fn parse_bound(raw: &str, is_end: bool) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(ts) = parse_ts(raw) {
        return Some(ts);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = if is_end {
        date.and_hms_opt(23, 59, 59)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(time.and_utc())
}

/// Event timestamps arrive either zoned (RFC 3339) or bare
fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Round to the nearest minute, ties up
fn round_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    let rem = secs.rem_euclid(60);
    let rounded = if rem >= 30 {
        secs - rem + 60
    } else {
        secs - rem
    };
    DateTime::from_timestamp(rounded, 0).unwrap_or(ts)
}

#[derive(Debug, Clone, Default)]
pub struct EventTable {
    rows: Vec<EventRow>,
}

impl EventTable {
    /// Build the table from fetched events, dropping rows whose timestamp
    /// does not parse
    pub fn from_events(events: Vec<HttpEvent>) -> Self {
        let mut rows = Vec::with_capacity(events.len());
        for event in events {
            let Some(ts) = parse_ts(&event.ts) else {
                warn!(ts = %event.ts, "Dropping event with unparseable timestamp");
                continue;
            };
            rows.push(EventRow {
                minute: round_to_minute(ts),
                status: event.status,
                upstream_status: event.upstream_status,
                request_time: event.request_time,
                upstream_response_time: event.upstream_response_time,
                remote_address: event.remote_address,
                request_uri: event.request_uri,
                count: event.count,
            });
        }
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows per (minute, status) pair, ordered by minute then status
    pub fn status_counts(&self, range: &DateRange) -> Vec<StatusCount> {
        let mut groups: BTreeMap<(DateTime<Utc>, u16), i64> = BTreeMap::new();
        for row in self.rows.iter().filter(|r| range.contains(r.minute)) {
            *groups.entry((row.minute, row.status)).or_insert(0) += 1;
        }
        groups
            .into_iter()
            .map(|((minute, status), count)| StatusCount {
                minute,
                status,
                count,
            })
            .collect()
    }

    /// Rows per (minute, upstream status) pair; rows with no upstream
    /// status are left out
    pub fn upstream_status_counts(&self, range: &DateRange) -> Vec<StatusCount> {
        let mut groups: BTreeMap<(DateTime<Utc>, u16), i64> = BTreeMap::new();
        for row in self.rows.iter().filter(|r| range.contains(r.minute)) {
            if let Some(upstream) = row.upstream_status {
                *groups.entry((row.minute, upstream)).or_insert(0) += 1;
            }
        }
        groups
            .into_iter()
            .map(|((minute, status), count)| StatusCount {
                minute,
                status,
                count,
            })
            .collect()
    }

    /// Remote addresses ranked by summed occurrence count
    pub fn top_remote_addresses(&self, n: usize) -> Vec<AddressCount> {
        let mut sums: BTreeMap<&str, i64> = BTreeMap::new();
        for row in &self.rows {
            if let Some(addr) = row.remote_address.as_deref() {
                *sums.entry(addr).or_insert(0) += row.count;
            }
        }
        let mut ranked: Vec<AddressCount> = sums
            .into_iter()
            .map(|(remote_address, count)| AddressCount {
                remote_address: remote_address.to_string(),
                count,
            })
            .collect();
        // BTreeMap iteration keeps ties in address order
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }

    /// Request URIs ranked by summed occurrence count
    pub fn top_request_uris(&self, n: usize) -> Vec<UriCount> {
        let mut sums: BTreeMap<&str, i64> = BTreeMap::new();
        for row in &self.rows {
            *sums.entry(row.request_uri.as_str()).or_insert(0) += row.count;
        }
        let mut ranked: Vec<UriCount> = sums
            .into_iter()
            .map(|(request_uri, count)| UriCount {
                request_uri: request_uri.to_string(),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }

    /// Per-minute mean of requestTime and upstreamResponseTime, clamped to
    /// REQUEST_TIME_CEILING
    pub fn request_time_series(&self, range: &DateRange) -> Vec<RequestTimePoint> {
        struct Acc {
            request_sum: f64,
            request_n: u32,
            upstream_sum: f64,
            upstream_n: u32,
        }

        let mut groups: BTreeMap<DateTime<Utc>, Acc> = BTreeMap::new();
        for row in self.rows.iter().filter(|r| range.contains(r.minute)) {
            let acc = groups.entry(row.minute).or_insert(Acc {
                request_sum: 0.0,
                request_n: 0,
                upstream_sum: 0.0,
                upstream_n: 0,
            });
            if let Some(t) = row.request_time {
                acc.request_sum += t;
                acc.request_n += 1;
            }
            if let Some(t) = row.upstream_response_time {
                acc.upstream_sum += t;
                acc.upstream_n += 1;
            }
        }

        let mean = |sum: f64, n: u32| if n > 0 { sum / n as f64 } else { 0.0 };
        groups
            .into_iter()
            .map(|(minute, acc)| RequestTimePoint {
                minute,
                request_time: mean(acc.request_sum, acc.request_n).min(REQUEST_TIME_CEILING),
                upstream_response_time: mean(acc.upstream_sum, acc.upstream_n)
                    .min(REQUEST_TIME_CEILING),
            })
            .collect()
    }
}
