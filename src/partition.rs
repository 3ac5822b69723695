//! Partition key selection for admitted URLs.
//!
//! The partition key decides which downstream worker or queue owns a URL.
//! Three modes are supported: by hostname, by registrable domain, or by
//! resolved IP address. IP mode consults the shared [`ResolverCache`] and
//! falls back to a DNS lookup on a miss; an `ip` metadata field provided by
//! an upstream stage bypasses resolution entirely.
//!
//! Per-item failures (malformed URL, failed resolution) are expected
//! outcomes and surface as [`DropReason`], never as errors.

use crate::metadata::{Metadata, IP_METADATA_KEY};
use crate::resolver::{Resolve, ResolverCache};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// Strategy for deriving a partition key from a URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartitionMode {
    /// Partition by the URL's host, verbatim.
    #[default]
    Host,
    /// Partition by the registrable (pay-level) domain of the host.
    Domain,
    /// Partition by the host's resolved IP address.
    Ip,
}

impl PartitionMode {
    /// Parses a configured mode name, ignoring case.
    ///
    /// Unrecognized values fall back to [`PartitionMode::Host`] with a
    /// warning; this never fails per item.
    pub fn from_config(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "host" => PartitionMode::Host,
            "domain" => PartitionMode::Domain,
            "ip" => PartitionMode::Ip,
            other => {
                warn!("Unknown partition mode '{}', forcing to host", other);
                PartitionMode::Host
            }
        }
    }

    /// Configuration-form name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionMode::Host => "host",
            PartitionMode::Domain => "domain",
            PartitionMode::Ip => "ip",
        }
    }
}

/// Why an item was removed from further processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The URL could not be parsed or has no host component.
    InvalidUrl,
    /// The host could not be resolved to an IP address.
    ResolutionFailed,
}

impl DropReason {
    /// Diagnostic counter name for this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::InvalidUrl => "invalid-url",
            DropReason::ResolutionFailed => "resolution-failed",
        }
    }
}

/// How a partition key was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Host component of the URL.
    Host,
    /// Registrable domain derived from the host.
    Domain,
    /// IP address carried in the item's metadata.
    Provided,
    /// IP address served from the resolver cache.
    CachedIp,
    /// IP address freshly resolved via DNS.
    ResolvedIp,
}

/// A computed partition key and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionKey {
    /// The key downstream sharding operates on.
    pub key: String,
    /// Provenance, used for diagnostic counters.
    pub source: KeySource,
}

impl PartitionKey {
    fn new(key: impl Into<String>, source: KeySource) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }
}

/// Computes partition keys for URLs under a fixed mode.
///
/// Immutable after construction apart from the shared resolver cache; safe
/// to share across any number of concurrent routing workers.
pub struct Partitioner {
    mode: PartitionMode,
    cache: Arc<ResolverCache>,
    resolver: Arc<dyn Resolve>,
}

impl Partitioner {
    /// Creates a partitioner over the given cache and resolver.
    pub fn new(mode: PartitionMode, cache: Arc<ResolverCache>, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            mode,
            cache,
            resolver,
        }
    }

    /// The configured partition mode.
    pub fn mode(&self) -> PartitionMode {
        self.mode
    }

    /// Computes the partition key for `url`.
    ///
    /// Awaits only when IP mode needs a fresh DNS resolution; the resolver
    /// cache is left valid regardless of the outcome.
    pub async fn select(
        &self,
        url: &str,
        metadata: &Metadata,
    ) -> Result<PartitionKey, DropReason> {
        if self.mode == PartitionMode::Ip {
            if let Some(provided) = metadata.first_value(IP_METADATA_KEY) {
                if !provided.trim().is_empty() {
                    return Ok(PartitionKey::new(provided, KeySource::Provided));
                }
            }
        }

        let host = match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => host.to_string(),
                None => {
                    warn!("Invalid URL, no host component: {}", url);
                    return Err(DropReason::InvalidUrl);
                }
            },
            Err(error) => {
                warn!("Invalid URL: {} ({})", url, error);
                return Err(DropReason::InvalidUrl);
            }
        };

        match self.mode {
            PartitionMode::Host => Ok(PartitionKey::new(host, KeySource::Host)),
            PartitionMode::Domain => {
                Ok(PartitionKey::new(registrable_domain(&host), KeySource::Domain))
            }
            PartitionMode::Ip => self.select_by_ip(url, host).await,
        }
    }

    async fn select_by_ip(&self, url: &str, host: String) -> Result<PartitionKey, DropReason> {
        if let Some(cached) = self.cache.get(&host) {
            return Ok(PartitionKey::new(cached, KeySource::CachedIp));
        }

        let start = Instant::now();
        match self.resolver.resolve(&host).await {
            Ok(address) => {
                let ip = address.to_string();
                debug!("Resolved IP {} in {:?} for: {}", ip, start.elapsed(), url);
                self.cache.insert(host, ip.clone());
                Ok(PartitionKey::new(ip, KeySource::ResolvedIp))
            }
            Err(error) => {
                warn!("Unable to resolve IP for: {} ({})", host, error);
                Err(DropReason::ResolutionFailed)
            }
        }
    }
}

// Public-suffix-aware reduction of a host to its registrable portion. Hosts
// with no registrable form (IP literals, single labels) partition by the
// host itself.
fn registrable_domain(host: &str) -> String {
    psl::domain_str(host)
        .map(str::to_string)
        .unwrap_or_else(|| host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterError;
    use async_trait::async_trait;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedResolver {
        ip: IpAddr,
        calls: AtomicUsize,
    }

    impl FixedResolver {
        fn new(ip: &str) -> Self {
            Self {
                ip: ip.parse().unwrap(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Resolve for FixedResolver {
        async fn resolve(&self, _host: &str) -> Result<IpAddr, RouterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.ip)
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl Resolve for FailingResolver {
        async fn resolve(&self, host: &str) -> Result<IpAddr, RouterError> {
            Err(RouterError::Resolution {
                host: host.to_string(),
                message: "unreachable".to_string(),
            })
        }
    }

    fn partitioner(mode: PartitionMode, resolver: Arc<dyn Resolve>) -> Partitioner {
        Partitioner::new(
            mode,
            Arc::new(ResolverCache::new(4).unwrap()),
            resolver,
        )
    }

    #[tokio::test]
    async fn host_mode_uses_host_verbatim() {
        let partitioner = partitioner(PartitionMode::Host, Arc::new(FailingResolver));
        let key = partitioner
            .select("http://www.example.com/", &Metadata::new())
            .await
            .unwrap();
        assert_eq!(key.key, "www.example.com");
        assert_eq!(key.source, KeySource::Host);
    }

    #[tokio::test]
    async fn domain_mode_reduces_to_registrable_domain() {
        let partitioner = partitioner(PartitionMode::Domain, Arc::new(FailingResolver));
        let key = partitioner
            .select("http://www.example.com/", &Metadata::new())
            .await
            .unwrap();
        assert_eq!(key.key, "example.com");

        let key = partitioner
            .select("http://www.example.co.uk/page", &Metadata::new())
            .await
            .unwrap();
        assert_eq!(key.key, "example.co.uk");
        assert_eq!(key.source, KeySource::Domain);
    }

    #[tokio::test]
    async fn provided_ip_bypasses_resolution() {
        let resolver = Arc::new(FixedResolver::new("9.9.9.9"));
        let partitioner = partitioner(PartitionMode::Ip, Arc::clone(&resolver) as Arc<dyn Resolve>);
        let mut metadata = Metadata::new();
        metadata.add_value(IP_METADATA_KEY, "1.2.3.4");

        let key = partitioner
            .select("http://www.example.com/", &metadata)
            .await
            .unwrap();
        assert_eq!(key.key, "1.2.3.4");
        assert_eq!(key.source, KeySource::Provided);
        assert_eq!(resolver.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_provided_ip_is_ignored() {
        let resolver = Arc::new(FixedResolver::new("93.184.216.34"));
        let partitioner = partitioner(PartitionMode::Ip, Arc::clone(&resolver) as Arc<dyn Resolve>);
        let mut metadata = Metadata::new();
        metadata.add_value(IP_METADATA_KEY, "   ");

        let key = partitioner
            .select("http://www.example.com/", &metadata)
            .await
            .unwrap();
        assert_eq!(key.key, "93.184.216.34");
        assert_eq!(resolver.call_count(), 1);
    }

    #[tokio::test]
    async fn second_lookup_for_same_host_hits_cache() {
        let resolver = Arc::new(FixedResolver::new("93.184.216.34"));
        let partitioner = partitioner(PartitionMode::Ip, Arc::clone(&resolver) as Arc<dyn Resolve>);

        let first = partitioner
            .select("http://www.example.com/", &Metadata::new())
            .await
            .unwrap();
        assert_eq!(first.source, KeySource::ResolvedIp);

        let second = partitioner
            .select("http://www.example.com/other", &Metadata::new())
            .await
            .unwrap();
        assert_eq!(second.source, KeySource::CachedIp);
        assert_eq!(second.key, first.key);
        assert_eq!(resolver.call_count(), 1);
    }

    #[tokio::test]
    async fn resolution_failure_drops_the_item() {
        let partitioner = partitioner(PartitionMode::Ip, Arc::new(FailingResolver));
        let outcome = partitioner
            .select("http://unresolvable.test/", &Metadata::new())
            .await;
        assert_eq!(outcome, Err(DropReason::ResolutionFailed));
    }

    #[tokio::test]
    async fn malformed_url_drops_the_item() {
        let partitioner = partitioner(PartitionMode::Host, Arc::new(FailingResolver));
        let outcome = partitioner.select("not a url", &Metadata::new()).await;
        assert_eq!(outcome, Err(DropReason::InvalidUrl));

        let outcome = partitioner.select("mailto:someone@example.com", &Metadata::new()).await;
        assert_eq!(outcome, Err(DropReason::InvalidUrl));
    }

    #[test]
    fn unknown_mode_falls_back_to_host() {
        assert_eq!(PartitionMode::from_config("HOST"), PartitionMode::Host);
        assert_eq!(PartitionMode::from_config("Domain"), PartitionMode::Domain);
        assert_eq!(PartitionMode::from_config("ip"), PartitionMode::Ip);
        assert_eq!(PartitionMode::from_config("shoe-size"), PartitionMode::Host);
    }
}
