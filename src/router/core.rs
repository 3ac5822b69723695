//! The per-item routing orchestrator.
//!
//! A `Router` ties together the metadata filter, the partition key selector
//! and the statistics collector. It is built once from configuration, is
//! immutable afterwards, and is shared across all routing workers. Every
//! call to [`Router::route`] returns a definite outcome: per-item failures
//! are absorbed here and surface only as diagnostic counters.

use crate::filter::FilterTree;
use crate::item::{CrawlItem, RoutedItem};
use crate::partition::{DropReason, KeySource, Partitioner};
use crate::stats::RouterStats;
use std::sync::Arc;
use tracing::debug;

/// The definite result of routing one item.
#[derive(Debug)]
pub enum RouteOutcome {
    /// The item was admitted and assigned a partition key.
    Routed(RoutedItem),
    /// The metadata filter disqualified the item; nothing is propagated.
    Rejected,
    /// The item was silently removed; the matching diagnostic counter has
    /// been incremented.
    Dropped(DropReason),
}

/// Admission-control and routing stage for candidate URLs.
pub struct Router {
    filter: FilterTree,
    partitioner: Partitioner,
    stats: Arc<RouterStats>,
    max_concurrent_routes: usize,
}

impl Router {
    pub(crate) fn new(
        filter: FilterTree,
        partitioner: Partitioner,
        stats: Arc<RouterStats>,
        max_concurrent_routes: usize,
    ) -> Self {
        Router {
            filter,
            partitioner,
            stats,
            max_concurrent_routes,
        }
    }

    /// Routes one item through admission and partitioning.
    ///
    /// Never fails: malformed URLs and failed resolutions come back as
    /// [`RouteOutcome::Dropped`] with the matching counter incremented, and
    /// the resolver cache is left valid regardless of the outcome.
    pub async fn route(&self, item: CrawlItem) -> RouteOutcome {
        self.stats.increment_items_received();

        if self.filter.rejects(&item.metadata) {
            debug!("Rejected by metadata filter: {}", item.url);
            self.stats.increment_items_rejected();
            return RouteOutcome::Rejected;
        }

        match self.partitioner.select(&item.url, &item.metadata).await {
            Ok(partition_key) => {
                match partition_key.source {
                    KeySource::Provided => self.stats.increment_ip_provided(),
                    KeySource::CachedIp => self.stats.increment_ip_cache_hits(),
                    KeySource::ResolvedIp => self.stats.increment_ip_resolved(),
                    KeySource::Host | KeySource::Domain => {}
                }
                debug!("Partition key for: {} > {}", item.url, partition_key.key);
                self.stats.increment_items_admitted();
                RouteOutcome::Routed(RoutedItem {
                    url: item.url,
                    partition_key: partition_key.key,
                    metadata: item.metadata,
                })
            }
            Err(reason) => {
                self.stats.record_drop(reason);
                RouteOutcome::Dropped(reason)
            }
        }
    }

    /// Runs only the admission step: returns the URL unchanged when the item
    /// is admitted, `None` when the metadata filter disqualifies it.
    pub fn admit<'a>(&self, url: &'a str, metadata: &crate::metadata::Metadata) -> Option<&'a str> {
        if self.filter.rejects(metadata) {
            None
        } else {
            Some(url)
        }
    }

    /// Returns a cloned Arc to the `RouterStats` instance used by this
    /// router.
    pub fn get_stats(&self) -> Arc<RouterStats> {
        Arc::clone(&self.stats)
    }

    /// The configured admission filter.
    pub fn filter(&self) -> &FilterTree {
        &self.filter
    }

    /// The configured partition key selector.
    pub fn partitioner(&self) -> &Partitioner {
        &self.partitioner
    }

    /// Upper bound on concurrently routed items for the worker task.
    pub fn max_concurrent_routes(&self) -> usize {
        self.max_concurrent_routes
    }
}
