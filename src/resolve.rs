//! DNS resolution of candidate hosts.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::LookupIpStrategy;
use hickory_resolver::TokioResolver;
use tracing::{debug, warn};

use crate::blocklist::RuleSet;
use crate::error::Error;

/// Upper bound on a single lookup. A lookup that takes longer is treated
/// like a failed one.
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that can turn a hostname into addresses.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Return every address record for `host`.
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, Error>;
}

/// Resolver backed by the system DNS configuration.
///
/// Requests both A and AAAA records so every address the HTTP client might
/// pick is checked.
pub struct SystemResolver {
    inner: TokioResolver,
}

impl SystemResolver {
    pub fn new() -> Result<Self, Error> {
        let mut builder =
            TokioResolver::builder_tokio().map_err(|e| Error::dns_error("system", e.to_string()))?;
        builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        Ok(Self {
            inner: builder.build(),
        })
    }
}

impl fmt::Debug for SystemResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl Resolve for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, Error> {
        let response = self
            .inner
            .lookup_ip(host)
            .await
            .map_err(|e| Error::dns_error(host, e.to_string()))?;
        Ok(response.iter().collect())
    }
}

/// Resolver with a fixed host table. Unknown hosts fail to resolve.
///
/// ```rust
/// use fetchgate::StaticResolver;
///
/// let resolver = StaticResolver::new()
///     .with_host("recipes.example", ["93.184.216.34".parse().unwrap()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        self.hosts
            .insert(host.to_ascii_lowercase(), addrs.into_iter().collect());
        self
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, Error> {
        self.hosts
            .get(&host.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| Error::dns_error(host, "no such host"))
    }
}

/// Resolve a host to the addresses that must be checked.
///
/// An IP literal (optionally bracketed) is returned as-is without any DNS
/// traffic. A hostname on the blocklist yields no addresses without a
/// lookup. Lookup errors and timeouts also yield no addresses; callers must
/// treat an empty result as a denial.
pub async fn resolve_host_addresses(
    rules: &RuleSet,
    resolver: &dyn Resolve,
    host: &str,
    timeout: Duration,
) -> Vec<IpAddr> {
    let host_str = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host_str.parse::<IpAddr>() {
        return vec![ip];
    }

    if rules.is_hostname_blocked(host) {
        return Vec::new();
    }

    match tokio::time::timeout(timeout, resolver.lookup(host)).await {
        Ok(Ok(addrs)) => addrs,
        Ok(Err(e)) => {
            debug!(host, error = %e, "DNS lookup failed");
            Vec::new()
        }
        Err(_) => {
            warn!(host, timeout_ms = timeout.as_millis() as u64, "DNS lookup timed out");
            Vec::new()
        }
    }
}
