//! Per-route comparison statistics.
//!
//! The route map is guarded by a read/write lock and only write-locked the
//! first time a route is seen. Each entry then owns its own counters
//! (atomics) and example map (mutex), so requests on different routes never
//! contend once their entries exist.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;

use crate::compare::{MismatchKind, Outcome};

/// Most recent divergence of one kind on a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferenceExample {
    pub message: String,
    pub details: Value,
    pub observed_at: DateTime<Utc>,
}

/// Counters and examples for a single route.
#[derive(Debug)]
pub struct RouteStatsEntry {
    route: String,
    identical: AtomicU64,
    mismatched: AtomicU64,
    examples: Mutex<HashMap<MismatchKind, DifferenceExample>>,
}

impl RouteStatsEntry {
    fn new(route: String) -> Self {
        Self {
            route,
            identical: AtomicU64::new(0),
            mismatched: AtomicU64::new(0),
            examples: Mutex::new(HashMap::new()),
        }
    }

    /// Count one comparison result. A mismatch replaces the stored example
    /// for its kind.
    pub fn record(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Identical => {
                self.identical.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Mismatch(m) => {
                self.mismatched.fetch_add(1, Ordering::Relaxed);
                let example = DifferenceExample {
                    message: m.message.clone(),
                    details: m.details.clone(),
                    observed_at: Utc::now(),
                };
                self.examples.lock().insert(m.kind, example);
            }
        }
    }

    pub fn identical_count(&self) -> u64 {
        self.identical.load(Ordering::Relaxed)
    }

    pub fn mismatch_count(&self) -> u64 {
        self.mismatched.load(Ordering::Relaxed)
    }

    /// Deep copy of the entry.
    pub fn snapshot(&self) -> RouteStatsSnapshot {
        let examples = self
            .examples
            .lock()
            .iter()
            .map(|(kind, example)| (*kind, example.clone()))
            .collect();
        RouteStatsSnapshot {
            route: self.route.clone(),
            identical_count: self.identical_count(),
            mismatch_count: self.mismatch_count(),
            examples,
        }
    }
}

/// Point-in-time copy of a route's statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStatsSnapshot {
    pub route: String,
    pub identical_count: u64,
    pub mismatch_count: u64,
    pub examples: BTreeMap<MismatchKind, DifferenceExample>,
}

/// Route key → statistics entry.
#[derive(Debug, Default)]
pub struct RouteStatistics {
    routes: RwLock<HashMap<String, Arc<RouteStatsEntry>>>,
}

impl RouteStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `route`, created on first use.
    pub fn get_or_create(&self, route: &str) -> Arc<RouteStatsEntry> {
        if let Some(entry) = self.routes.read().get(route) {
            return Arc::clone(entry);
        }

        let mut routes = self.routes.write();
        Arc::clone(
            routes
                .entry(route.to_string())
                .or_insert_with(|| Arc::new(RouteStatsEntry::new(route.to_string()))),
        )
    }

    /// Record `outcome` against `route`.
    pub fn record(&self, route: &str, outcome: &Outcome) {
        self.get_or_create(route).record(outcome);
    }

    /// Copies of every entry, sorted by route. Locks are released before
    /// the copies are returned.
    pub fn snapshot_all(&self) -> Vec<RouteStatsSnapshot> {
        let entries: Vec<Arc<RouteStatsEntry>> = self.routes.read().values().cloned().collect();
        let mut snapshots: Vec<RouteStatsSnapshot> = entries.iter().map(|e| e.snapshot()).collect();
        snapshots.sort_by(|a, b| a.route.cmp(&b.route));
        snapshots
    }

    /// Number of distinct routes observed.
    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }
}
