//! # Builder Module
//!
//! Provides the `RouterBuilder`, a fluent API for constructing and
//! configuring `Router` instances.
//!
//! ## Overview
//!
//! The builder assembles the admission filter, the partition key selector
//! and the resolver cache into a ready-to-use `Router`. All validation
//! happens here, once, at build time: a malformed filter configuration or an
//! invalid capacity prevents startup, and per-item routing never re-validates
//! configuration.
//!
//! ## Example
//!
//! ```rust,ignore
//! use frontier_router::{PartitionMode, RouterBuilder};
//! use serde_json::json;
//!
//! let router = RouterBuilder::new()
//!     .partition_mode(PartitionMode::Domain)
//!     .filter_config(json!({
//!         "operation": "AND",
//!         "filters": {"fetch.statusCode": "410", "noindex": "true"}
//!     }))
//!     .resolver_cache_capacity(1000)
//!     .build()?;
//! ```

use crate::error::RouterError;
use crate::filter::FilterTree;
use crate::partition::{PartitionMode, Partitioner};
use crate::resolver::{Resolve, ResolverCache, SystemResolver, DEFAULT_RESOLVER_CACHE_CAPACITY};
use crate::router::Router;
use crate::stats::RouterStats;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

fn default_partition_mode() -> String {
    PartitionMode::Host.as_str().to_string()
}

fn default_cache_capacity() -> usize {
    DEFAULT_RESOLVER_CACHE_CAPACITY
}

fn default_max_concurrent_routes() -> usize {
    num_cpus::get().min(8)
}

/// Declarative configuration for the routing stage.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Partition mode name: `host`, `domain` or `ip` (case-insensitive).
    /// Unrecognized values fall back to `host` with a warning.
    #[serde(default = "default_partition_mode")]
    pub partition_mode: String,
    /// Filter configuration; absent means no rule configured.
    #[serde(default)]
    pub filter: Option<Value>,
    /// Capacity of the hostname resolution cache.
    #[serde(default = "default_cache_capacity")]
    pub resolver_cache_capacity: usize,
    /// Upper bound on concurrently routed items.
    #[serde(default = "default_max_concurrent_routes")]
    pub max_concurrent_routes: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            partition_mode: default_partition_mode(),
            filter: None,
            resolver_cache_capacity: default_cache_capacity(),
            max_concurrent_routes: default_max_concurrent_routes(),
        }
    }
}

/// Fluent builder for [`Router`] instances.
pub struct RouterBuilder {
    partition_mode: PartitionMode,
    filter_config: Option<Value>,
    resolver_cache_capacity: usize,
    max_concurrent_routes: usize,
    resolver: Option<Arc<dyn Resolve>>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self {
            partition_mode: PartitionMode::default(),
            filter_config: None,
            resolver_cache_capacity: DEFAULT_RESOLVER_CACHE_CAPACITY,
            max_concurrent_routes: default_max_concurrent_routes(),
            resolver: None,
        }
    }
}

impl RouterBuilder {
    /// Creates a builder with default settings: host partitioning, no filter
    /// configured, default cache capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from a declarative configuration.
    pub fn from_config(config: RouterConfig) -> Self {
        let mut builder = Self::new()
            .partition_mode(PartitionMode::from_config(&config.partition_mode))
            .resolver_cache_capacity(config.resolver_cache_capacity)
            .max_concurrent_routes(config.max_concurrent_routes);
        if let Some(filter) = config.filter {
            builder = builder.filter_config(filter);
        }
        builder
    }

    /// Sets the partition mode.
    pub fn partition_mode(mut self, mode: PartitionMode) -> Self {
        self.partition_mode = mode;
        self
    }

    /// Sets the JSON filter configuration.
    pub fn filter_config(mut self, config: Value) -> Self {
        self.filter_config = Some(config);
        self
    }

    /// Sets the resolver cache capacity.
    pub fn resolver_cache_capacity(mut self, capacity: usize) -> Self {
        self.resolver_cache_capacity = capacity;
        self
    }

    /// Sets the maximum number of concurrently routed items.
    pub fn max_concurrent_routes(mut self, limit: usize) -> Self {
        self.max_concurrent_routes = limit;
        self
    }

    /// Replaces the DNS resolver used for IP-mode partitioning.
    pub fn resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Builds the `Router`, validating all configuration.
    ///
    /// Fails with [`RouterError::ConfigurationError`] on a structurally
    /// invalid filter configuration, a zero cache capacity or a zero
    /// concurrency limit. This is the only place configuration errors can
    /// surface; per-item routing never fails on configuration.
    pub fn build(self) -> Result<Router, RouterError> {
        if self.max_concurrent_routes == 0 {
            return Err(RouterError::ConfigurationError(
                "max_concurrent_routes must be greater than 0.".to_string(),
            ));
        }

        let filter = match &self.filter_config {
            Some(config) => FilterTree::from_json(config)?,
            None => FilterTree::empty(),
        };

        let cache = Arc::new(ResolverCache::new(self.resolver_cache_capacity)?);
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(SystemResolver) as Arc<dyn Resolve>);

        info!("Using partition mode: {}", self.partition_mode.as_str());

        Ok(Router::new(
            filter,
            Partitioner::new(self.partition_mode, cache, resolver),
            Arc::new(RouterStats::new()),
            self.max_concurrent_routes,
        ))
    }
}
