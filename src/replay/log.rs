//! Bounded per-(route, outcome) history of divergent requests.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use super::curl::to_curl;
use crate::http::request::RequestSnapshot;

/// One replayable divergent request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayRecord {
    pub route: String,
    pub outcome: String,
    pub timestamp: DateTime<Utc>,
    pub curl_cmd: String,
    pub details: String,
}

impl ReplayRecord {
    /// Build a record for `snapshot`, stamped now.
    pub fn from_snapshot(
        route: &str,
        outcome: &str,
        snapshot: &RequestSnapshot,
        details: impl Into<String>,
    ) -> Self {
        Self {
            route: route.to_string(),
            outcome: outcome.to_string(),
            timestamp: Utc::now(),
            curl_cmd: to_curl(snapshot),
            details: details.into(),
        }
    }
}

/// FIFO queues keyed by `{route}_{outcome}`, each holding at most
/// `capacity` records. The oldest record is evicted first.
#[derive(Debug)]
pub struct ReplayLog {
    capacity: usize,
    entries: DashMap<String, VecDeque<ReplayRecord>>,
}

impl ReplayLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: DashMap::new(),
        }
    }

    fn key(route: &str, outcome: &str) -> String {
        format!("{route}_{outcome}")
    }

    /// Append `record` under (`route`, `outcome`).
    pub fn append(&self, route: &str, outcome: &str, record: ReplayRecord) {
        let mut queue = self.entries.entry(Self::key(route, outcome)).or_default();
        if queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(record);
    }

    /// Records for (`route`, `outcome`), oldest first. Unknown keys yield
    /// an empty list.
    pub fn query(&self, route: &str, outcome: &str) -> Vec<ReplayRecord> {
        self.entries
            .get(&Self::key(route, outcome))
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Total records held across all keys.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|q| q.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: usize) -> ReplayRecord {
        ReplayRecord {
            route: "/r".into(),
            outcome: "body mismatch".into(),
            timestamp: Utc::now(),
            curl_cmd: format!("curl -X GET 'http://h/r?n={n}'"),
            details: n.to_string(),
        }
    }

    #[test]
    fn test_unknown_key_is_empty() {
        let log = ReplayLog::new(20);
        assert!(log.query("/nothing", "body mismatch").is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let log = ReplayLog::new(3);
        for n in 0..5 {
            log.append("/r", "body mismatch", record(n));
        }

        let details: Vec<String> = log
            .query("/r", "body mismatch")
            .into_iter()
            .map(|r| r.details)
            .collect();
        assert_eq!(details, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_keys_are_independent() {
        let log = ReplayLog::new(2);
        log.append("/r", "body mismatch", record(1));
        log.append("/r", "header mismatch", record(2));
        log.append("/s", "body mismatch", record(3));

        assert_eq!(log.query("/r", "body mismatch").len(), 1);
        assert_eq!(log.query("/r", "header mismatch")[0].details, "2");
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_from_snapshot_renders_curl() {
        use axum::http::{HeaderMap, Method, Version};
        use bytes::Bytes;

        let mut headers = HeaderMap::new();
        headers.insert("host", "svc".parse().unwrap());
        let snapshot = RequestSnapshot::new(
            Method::GET,
            "/r".parse().unwrap(),
            Version::HTTP_11,
            headers,
            Bytes::new(),
        );

        let rec = ReplayRecord::from_snapshot("/r", "status code mismatch", &snapshot, "x");
        assert_eq!(rec.curl_cmd, "curl -X GET 'http://svc/r' -H 'host: svc'");
        assert_eq!(rec.outcome, "status code mismatch");
    }
}
