//! EventsQuery document construction
//!
//! The query shape is fixed: a tsRange filter, count aggregation on ts,
//! count_DESC ordering and a flat field selection. Only the time bounds,
//! the row limit and the groupBy list vary.

use super::QueryWindow;

/// Which groupBy list to request. The startup snapshot groups by every
/// selected field; the upstream status refetch leaves remoteAddress out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Full,
    NoRemoteAddress,
}

impl GroupBy {
    fn fields(self) -> &'static str {
        match self {
            GroupBy::Full => {
                "[ts, requestUri, status, host, upstreamStatus, requestTime, upstreamResponseTime, remoteAddress]"
            }
            GroupBy::NoRemoteAddress => {
                "[ts, requestUri, status, host, upstreamStatus, requestTime, upstreamResponseTime]"
            }
        }
    }

    fn selection(self) -> &'static str {
        match self {
            GroupBy::Full => {
                "ts\n            host\n            requestUri\n            status\n            upstreamStatus\n            requestTime\n            upstreamResponseTime\n            remoteAddress\n            count"
            }
            GroupBy::NoRemoteAddress => {
                "ts\n            host\n            requestUri\n            status\n            upstreamStatus\n            requestTime\n            upstreamResponseTime\n            count"
            }
        }
    }
}

pub fn events_document(window: &QueryWindow, group_by: GroupBy, limit: u32) -> String {
    format!(
        r#"query EventsQuery {{
    httpEvents(
        limit: {limit},
        filter: {{
            tsRange: {{begin: "{begin}", end: "{end}"}}
        }},
        aggregate: {{count: ts}}
        groupBy: {group_by}
        orderBy: [count_DESC]
    )
        {{
            {selection}
        }}
}}"#,
        limit = limit,
        begin = window.begin_str(),
        end = window.end_str(),
        group_by = group_by.fields(),
        selection = group_by.selection(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn window() -> QueryWindow {
        QueryWindow {
            begin: DateTime::parse_from_rfc3339("2026-07-28T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            end: DateTime::parse_from_rfc3339("2026-08-27T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn document_interpolates_bounds_and_limit() {
        let doc = events_document(&window(), GroupBy::Full, 10000);
        assert!(doc.contains(r#"begin: "2026-07-28T00:00:00""#));
        assert!(doc.contains(r#"end: "2026-08-27T00:00:00""#));
        assert!(doc.contains("limit: 10000,"));
        assert!(doc.contains("orderBy: [count_DESC]"));
        assert!(doc.contains("aggregate: {count: ts}"));
    }

    #[test]
    fn full_group_by_includes_remote_address() {
        let doc = events_document(&window(), GroupBy::Full, 10000);
        assert!(doc.contains("remoteAddress]"));
        assert!(doc.contains("remoteAddress\n"));
    }

    #[test]
    fn upstream_group_by_leaves_remote_address_out() {
        let doc = events_document(&window(), GroupBy::NoRemoteAddress, 10000);
        assert!(!doc.contains("remoteAddress"));
        assert!(doc.contains("upstreamResponseTime]"));
    }
}
