//! # frontier-router
//!
//! Admission control and partition routing core for a distributed crawl
//! frontier.
//!
//! For every candidate URL flowing through the pipeline, the router decides
//! from document metadata whether the URL is admitted or rejected by
//! evaluating a configurable boolean rule tree, and computes the partition
//! key (host, registrable domain or resolved IP address) that determines
//! which downstream worker owns the URL. Repeated DNS resolutions are
//! bounded by a shared fixed-size LRU cache.
//!
//! ## Example
//!
//! ```rust,ignore
//! use frontier_router::{CrawlItem, Metadata, RouteOutcome, RouterBuilder};
//! use serde_json::json;
//!
//! let router = RouterBuilder::new()
//!     .filter_config(json!({"noindex": "true"}))
//!     .build()?;
//!
//! let mut metadata = Metadata::new();
//! metadata.add_value("noindex", "false");
//!
//! match router.route(CrawlItem::new("http://www.example.com/", metadata)).await {
//!     RouteOutcome::Routed(item) => println!("{} -> {}", item.url, item.partition_key),
//!     RouteOutcome::Rejected => println!("disqualified by metadata"),
//!     RouteOutcome::Dropped(reason) => println!("dropped: {}", reason.as_str()),
//! }
//! ```

pub mod builder;
pub mod error;
pub mod filter;
pub mod item;
pub mod metadata;
pub mod partition;
pub mod prelude;
pub mod resolver;
pub mod router;
pub mod state;
pub mod stats;

pub use builder::{RouterBuilder, RouterConfig};
pub use error::RouterError;
pub use filter::{FilterNode, FilterOp, FilterTree};
pub use item::{CrawlItem, RoutedItem};
pub use metadata::{Metadata, IP_METADATA_KEY};
pub use partition::{DropReason, KeySource, PartitionKey, PartitionMode, Partitioner};
pub use resolver::{Resolve, ResolverCache, SystemResolver, DEFAULT_RESOLVER_CACHE_CAPACITY};
pub use router::{spawn_router_task, RouteOutcome, Router};
pub use state::RouterState;
pub use stats::RouterStats;

// Re-exported for implementing [`Resolve`] outside this crate.
pub use async_trait::async_trait;
