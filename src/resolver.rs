//! Hostname resolution and its bounded cache.
//!
//! IP-based partitioning needs one DNS lookup per distinct host. The
//! [`ResolverCache`] bounds that cost: a fixed-capacity, least-recently-used
//! cache of hostname to IP-literal mappings, shared by reference across all
//! routing workers. Every operation takes a single coarse critical section,
//! so concurrent lookups, insertions and evictions are serialized with
//! respect to each other.
//!
//! Resolution itself goes through the [`Resolve`] trait so the system
//! resolver can be swapped out. There is no timeout on a lookup: a slow
//! resolution suspends only the worker that issued it.

use crate::error::RouterError;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::net::IpAddr;
use std::num::NonZeroUsize;

/// Default number of hostname entries kept by the resolver cache.
pub const DEFAULT_RESOLVER_CACHE_CAPACITY: usize = 500;

/// Resolves a hostname to an IP address.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolves `host`, returning the first address found.
    async fn resolve(&self, host: &str) -> Result<IpAddr, RouterError>;
}

/// Resolver backed by the operating system's DNS machinery.
#[derive(Debug, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr, RouterError> {
        let mut addresses =
            tokio::net::lookup_host((host, 0u16))
                .await
                .map_err(|error| RouterError::Resolution {
                    host: host.to_string(),
                    message: error.to_string(),
                })?;
        addresses
            .next()
            .map(|address| address.ip())
            .ok_or_else(|| RouterError::Resolution {
                host: host.to_string(),
                message: "no addresses returned".to_string(),
            })
    }
}

/// Bounded hostname to IP-literal cache with LRU eviction.
///
/// Reads promote the entry to most-recently-used; inserting beyond capacity
/// evicts the least-recently-used entry.
pub struct ResolverCache {
    entries: Mutex<LruCache<String, String>>,
}

impl ResolverCache {
    /// Creates a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, RouterError> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            RouterError::ConfigurationError(
                "resolver cache capacity must be greater than 0".to_string(),
            )
        })?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Creates a cache with [`DEFAULT_RESOLVER_CACHE_CAPACITY`] entries.
    pub fn with_default_capacity() -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(DEFAULT_RESOLVER_CACHE_CAPACITY).unwrap(),
            )),
        }
    }

    /// Returns the cached IP literal for `host`, marking it most recently
    /// used.
    pub fn get(&self, host: &str) -> Option<String> {
        self.entries.lock().get(host).cloned()
    }

    /// Stores the IP literal for `host`, evicting the least-recently-used
    /// entry when over capacity.
    pub fn insert(&self, host: impl Into<String>, ip: impl Into<String>) {
        self.entries.lock().put(host.into(), ip.into());
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries the cache can hold.
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }
}

impl std::fmt::Debug for ResolverCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("ResolverCache")
            .field("len", &entries.len())
            .field("capacity", &entries.cap().get())
            .finish()
    }
}
