//! The allow/deny decision for outbound fetches.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tracing::{debug, warn};

use crate::blocklist::RuleSet;
use crate::config::GuardConfig;
use crate::error::{Denial, Error};
use crate::resolve::{resolve_host_addresses, Resolve, SystemResolver, DEFAULT_DNS_TIMEOUT};
use crate::safe_url::SafeUrl;

/// Decides whether a user-supplied URL may be fetched by the server.
///
/// A `Guard` is cheap to clone and safe to share between tasks: the rule
/// tables and resolver sit behind [`Arc`] and are never mutated.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use fetchgate::{Guard, RuleSet, StaticResolver};
///
/// # async fn example() {
/// let resolver = StaticResolver::new()
///     .with_host("recipes.example", ["93.184.216.34".parse().unwrap()]);
/// let guard = Guard::new(RuleSet::shared_default(), Arc::new(resolver));
///
/// assert!(guard.is_url_allowed_for_fetch("https://recipes.example/soup").await);
/// assert!(!guard.is_url_allowed_for_fetch("http://169.254.169.254/").await);
/// # }
/// ```
#[derive(Clone)]
pub struct Guard {
    rules: Arc<RuleSet>,
    resolver: Arc<dyn Resolve>,
    dns_timeout: Duration,
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("rules", &self.rules)
            .field("dns_timeout", &self.dns_timeout)
            .finish_non_exhaustive()
    }
}

impl Guard {
    pub fn new(rules: Arc<RuleSet>, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            rules,
            resolver,
            dns_timeout: DEFAULT_DNS_TIMEOUT,
        }
    }

    /// Default rules with the system DNS resolver.
    pub fn system() -> Result<Self, Error> {
        Ok(Self::new(
            RuleSet::shared_default(),
            Arc::new(SystemResolver::new()?),
        ))
    }

    /// Rules and timeout from `config`, resolving through `resolver`.
    pub fn from_config(config: &GuardConfig, resolver: Arc<dyn Resolve>) -> Result<Self, Error> {
        Ok(Self::new(Arc::new(config.rule_set()?), resolver).with_dns_timeout(config.dns_timeout()))
    }

    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Whether `url` may be fetched.
    ///
    /// Denies unless the URL is absolute http(s), its host is not on the
    /// hostname blocklist, and it resolves to at least one address with
    /// none of its addresses blocked. One internal address among public ones
    /// is enough to deny.
    pub async fn is_url_allowed_for_fetch(&self, url: &str) -> bool {
        match self.check(url).await {
            Ok((target, addrs)) => {
                debug!(url = target.as_str(), addresses = ?addrs, "URL allowed for fetch");
                true
            }
            Err(denial) => {
                debug!(url, kind = denial.kind(), reason = %denial, "URL denied for fetch");
                false
            }
        }
    }

    /// Like [`is_url_allowed_for_fetch`](Self::is_url_allowed_for_fetch),
    /// but returns [`Error::NotAllowed`] on denial. The error text is the same
    /// for every rule.
    pub async fn assert_url_allowed_for_fetch(&self, url: &str) -> Result<(), Error> {
        if self.is_url_allowed_for_fetch(url).await {
            Ok(())
        } else {
            Err(Error::NotAllowed)
        }
    }

    async fn check(&self, url: &str) -> Result<(SafeUrl, Vec<IpAddr>), Denial> {
        let safe_url = SafeUrl::parse(url)?;
        let host = safe_url.host();

        if let Some(reason) = self.rules.hostname_block_reason(host) {
            return Err(Denial::BlockedHostname {
                host: host.to_string(),
                reason,
            });
        }

        let addrs =
            resolve_host_addresses(&self.rules, self.resolver.as_ref(), host, self.dns_timeout)
                .await;
        if addrs.is_empty() {
            return Err(Denial::ResolutionFailure {
                host: host.to_string(),
            });
        }

        for &ip in &addrs {
            if let Some(reason) = self.rules.ip_block_reason(ip) {
                return Err(Denial::BlockedAddress {
                    host: host.to_string(),
                    ip,
                    reason,
                });
            }
        }

        Ok((safe_url, addrs))
    }
}

/// Check `url` with the default rules and the system resolver.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() {
/// if fetchgate::is_url_allowed_for_fetch("https://example.com/recipe").await {
///     // go ahead and fetch
/// }
/// # }
/// ```
pub async fn is_url_allowed_for_fetch(url: &str) -> bool {
    match Guard::system() {
        Ok(guard) => guard.is_url_allowed_for_fetch(url).await,
        Err(e) => {
            warn!(error = %e, "system resolver unavailable, denying fetch");
            false
        }
    }
}

/// Assert that `url` may be fetched, using the default rules and the system
/// resolver.
///
/// # Errors
///
/// Returns [`Error::NotAllowed`] whenever the URL is denied, whatever the
/// reason.
pub async fn assert_url_allowed_for_fetch(url: &str) -> Result<(), Error> {
    if is_url_allowed_for_fetch(url).await {
        Ok(())
    } else {
        Err(Error::NotAllowed)
    }
}

/// Synchronous version of [`is_url_allowed_for_fetch`].
///
/// This blocks the current thread while performing DNS resolution and works
/// both inside and outside of a Tokio runtime.
pub fn is_url_allowed_for_fetch_sync(url: &str) -> bool {
    block_on(is_url_allowed_for_fetch(url)).unwrap_or(false)
}

/// Synchronous version of [`assert_url_allowed_for_fetch`].
pub fn assert_url_allowed_for_fetch_sync(url: &str) -> Result<(), Error> {
    block_on(assert_url_allowed_for_fetch(url)).unwrap_or(Err(Error::NotAllowed))
}

/// Drive `future` to completion from synchronous code. `None` if no runtime
/// could be created.
fn block_on<F>(future: F) -> Option<F::Output>
where
    F: std::future::Future + Send,
    F::Output: Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Some(tokio::task::block_in_place(|| handle.block_on(future)))
        }
        // block_in_place panics on a current-thread runtime, so use a
        // private runtime on a scoped thread instead.
        Ok(_) => std::thread::scope(|scope| {
            scope
                .spawn(|| new_runtime().map(|rt| rt.block_on(future)))
                .join()
                .ok()
                .flatten()
        }),
        Err(_) => new_runtime().map(|rt| rt.block_on(future)),
    }
}

fn new_runtime() -> Option<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| warn!(error = %e, "failed to start runtime for sync check"))
        .ok()
}
