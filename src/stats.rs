//! # Statistics Module
//!
//! Collects metrics about the routing stage: how many items were received,
//! admitted, rejected or dropped, and how partition keys were obtained.
//!
//! ## Overview
//!
//! The `RouterStats` struct tracks diagnostic counters throughout routing.
//! Per-item failures never propagate as errors, so these counters are the
//! only externally visible trace of dropped items; operators watch them to
//! spot malformed feeds or broken DNS.
//!
//! All counters use atomic operations and are safe to update from any number
//! of concurrent workers. Snapshots capture a consistent view for reporting,
//! and the collector can render itself as text or JSON.

use crate::error::RouterError;
use crate::partition::DropReason;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

// A snapshot of the current statistics, used for reporting.
struct StatsSnapshot {
    items_received: usize,
    items_admitted: usize,
    items_rejected: usize,
    items_dropped: usize,
    ip_provided: usize,
    ip_cache_hits: usize,
    ip_resolved: usize,
    drop_reasons: HashMap<String, usize>,
    elapsed_duration: Duration,
}

impl StatsSnapshot {
    fn formatted_duration(&self) -> String {
        format!("{:?}", self.elapsed_duration)
    }

    fn items_per_second(&self) -> f64 {
        let total_seconds = self.elapsed_duration.as_secs();
        if total_seconds > 0 {
            self.items_received as f64 / total_seconds as f64
        } else {
            0.0
        }
    }
}

/// Collects and stores statistics about the routing stage.
#[derive(Debug, serde::Serialize)]
pub struct RouterStats {
    #[serde(skip)]
    start_time: Instant,

    /// Items entering the stage.
    pub items_received: AtomicUsize,
    /// Items that survived admission and received a partition key.
    pub items_admitted: AtomicUsize,
    /// Items rejected by the metadata filter.
    pub items_rejected: AtomicUsize,
    /// Items silently dropped (see `drop_reasons` for the breakdown).
    pub items_dropped: AtomicUsize,

    /// IP-mode keys taken from item metadata.
    pub ip_provided: AtomicUsize,
    /// IP-mode keys served from the resolver cache.
    pub ip_cache_hits: AtomicUsize,
    /// IP-mode keys obtained by a fresh DNS resolution.
    pub ip_resolved: AtomicUsize,

    /// Dropped-item counts broken down by diagnostic reason.
    pub drop_reasons: Arc<dashmap::DashMap<String, usize>>,
}

impl RouterStats {
    /// Creates a new `RouterStats` with all counters initialized to zero.
    pub fn new() -> Self {
        RouterStats {
            start_time: Instant::now(),
            items_received: AtomicUsize::new(0),
            items_admitted: AtomicUsize::new(0),
            items_rejected: AtomicUsize::new(0),
            items_dropped: AtomicUsize::new(0),
            ip_provided: AtomicUsize::new(0),
            ip_cache_hits: AtomicUsize::new(0),
            ip_resolved: AtomicUsize::new(0),
            drop_reasons: Arc::new(dashmap::DashMap::new()),
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        let mut drop_reasons: HashMap<String, usize> = HashMap::new();
        for entry in self.drop_reasons.iter() {
            let (reason, count) = entry.pair();
            drop_reasons.insert(reason.clone(), *count);
        }

        StatsSnapshot {
            items_received: self.items_received.load(Ordering::SeqCst),
            items_admitted: self.items_admitted.load(Ordering::SeqCst),
            items_rejected: self.items_rejected.load(Ordering::SeqCst),
            items_dropped: self.items_dropped.load(Ordering::SeqCst),
            ip_provided: self.ip_provided.load(Ordering::SeqCst),
            ip_cache_hits: self.ip_cache_hits.load(Ordering::SeqCst),
            ip_resolved: self.ip_resolved.load(Ordering::SeqCst),
            drop_reasons,
            elapsed_duration: self.start_time.elapsed(),
        }
    }

    pub(crate) fn increment_items_received(&self) {
        self.items_received.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_items_admitted(&self) {
        self.items_admitted.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_items_rejected(&self) {
        self.items_rejected.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_ip_provided(&self) {
        self.ip_provided.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_ip_cache_hits(&self) {
        self.ip_cache_hits.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_ip_resolved(&self) {
        self.ip_resolved.fetch_add(1, Ordering::SeqCst);
    }

    /// Records a dropped item under its diagnostic reason.
    pub(crate) fn record_drop(&self, reason: DropReason) {
        self.items_dropped.fetch_add(1, Ordering::SeqCst);
        *self
            .drop_reasons
            .entry(reason.as_str().to_string())
            .or_insert(0) += 1;
    }

    /// Dropped-item count for one diagnostic reason.
    pub fn drop_count(&self, reason: DropReason) -> usize {
        self.drop_reasons
            .get(reason.as_str())
            .map(|entry| *entry.value())
            .unwrap_or(0)
    }

    /// Converts the statistics into a JSON string.
    pub fn to_json_string(&self) -> Result<String, RouterError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Converts the statistics into a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String, RouterError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for RouterStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RouterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "\nRouting Statistics")?;
        writeln!(f, "------------------")?;
        writeln!(f, "  duration : {}", snapshot.formatted_duration())?;
        writeln!(f, "  speed    : item/s: {:.2}", snapshot.items_per_second())?;
        writeln!(
            f,
            "  items    : received: {}, admitted: {}, rejected: {}, dropped: {}",
            snapshot.items_received,
            snapshot.items_admitted,
            snapshot.items_rejected,
            snapshot.items_dropped
        )?;
        writeln!(
            f,
            "  ip keys  : provided: {}, from_cache: {}, resolved: {}",
            snapshot.ip_provided, snapshot.ip_cache_hits, snapshot.ip_resolved
        )?;

        let drops_string = if snapshot.drop_reasons.is_empty() {
            "none".to_string()
        } else {
            snapshot
                .drop_reasons
                .iter()
                .map(|(reason, count)| format!("{}: {}", reason, count))
                .collect::<Vec<String>>()
                .join(", ")
        };

        writeln!(f, "  drops    : {}\n", drops_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_reasons_are_tracked_separately() {
        let stats = RouterStats::new();
        stats.record_drop(DropReason::InvalidUrl);
        stats.record_drop(DropReason::InvalidUrl);
        stats.record_drop(DropReason::ResolutionFailed);

        assert_eq!(stats.items_dropped.load(Ordering::SeqCst), 3);
        assert_eq!(stats.drop_count(DropReason::InvalidUrl), 2);
        assert_eq!(stats.drop_count(DropReason::ResolutionFailed), 1);
    }

    #[test]
    fn exports_render_without_error() {
        let stats = RouterStats::new();
        stats.increment_items_received();
        stats.increment_items_admitted();
        assert!(stats.to_json_string().is_ok());
        assert!(format!("{}", stats).contains("received: 1"));
    }
}
