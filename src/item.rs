//! Item types flowing through the routing stage.

use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};

/// A candidate URL with its document metadata, produced upstream.
///
/// The router never mutates the URL string; it reads the metadata and, when
/// the item survives admission, emits a [`RoutedItem`] carrying the original
/// fields plus the derived partition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlItem {
    /// Candidate URL.
    pub url: String,
    /// Metadata from the source document.
    pub metadata: Metadata,
}

impl CrawlItem {
    /// Creates a new crawl item.
    pub fn new(url: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            url: url.into(),
            metadata,
        }
    }
}

/// An admitted item together with the partition key that owns it downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedItem {
    /// Original URL, unchanged.
    pub url: String,
    /// Shard assignment for downstream workers.
    pub partition_key: String,
    /// Original metadata, unchanged.
    pub metadata: Metadata,
}
