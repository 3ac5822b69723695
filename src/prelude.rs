//! A "prelude" for users of the `frontier-router` crate.
//!
//! This prelude re-exports the most commonly used traits and structs so that
//! they can be easily imported.
//!
//! # Example
//!
//! ```
//! use frontier_router::prelude::*;
//! ```

pub use crate::{
    // Core structs
    CrawlItem,
    FilterTree,
    Metadata,
    PartitionMode,
    RoutedItem,
    Router,
    RouterBuilder,
    RouterConfig,
    RouterStats,
    RouteOutcome,
    // Core traits
    Resolve,
    // Essential re-export for trait implementation
    async_trait,
};

pub use crate::error::RouterError;
pub use crate::partition::DropReason;
