//! Guard configuration.
//!
//! Configuration can only add rules on top of the built-in ones and tune the
//! DNS timeout. It is read from TOML or from `FETCHGATE_*` environment
//! variables:
//!
//! ```toml
//! dns_timeout_ms = 2000
//! extra_blocked_hostnames = ["intranet.example.com"]
//! extra_blocked_suffixes = [".corp.example.com"]
//! extra_blocked_cidrs = ["203.0.113.0/24", "2001:db8::/32"]
//! extra_blocked_ipv4_ranges = [["198.51.100.0", "198.51.100.255"]]
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::blocklist::RuleSet;
use crate::error::Error;
use crate::policy_builder::RuleSetBuilder;
use crate::resolve::DEFAULT_DNS_TIMEOUT;

/// Env var holding the DNS timeout in milliseconds.
pub const ENV_DNS_TIMEOUT_MS: &str = "FETCHGATE_DNS_TIMEOUT_MS";
/// Env var holding extra blocked hostnames, comma separated.
pub const ENV_BLOCKED_HOSTS: &str = "FETCHGATE_BLOCKED_HOSTS";
/// Env var holding extra blocked hostname suffixes, comma separated.
pub const ENV_BLOCKED_SUFFIXES: &str = "FETCHGATE_BLOCKED_SUFFIXES";
/// Env var holding extra blocked CIDRs, comma separated.
pub const ENV_BLOCKED_CIDRS: &str = "FETCHGATE_BLOCKED_CIDRS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    /// Lookup timeout. Unset means [`DEFAULT_DNS_TIMEOUT`].
    pub dns_timeout_ms: Option<u64>,
    pub extra_blocked_hostnames: Vec<String>,
    pub extra_blocked_suffixes: Vec<String>,
    pub extra_blocked_ipv4: Vec<String>,
    pub extra_blocked_ipv6: Vec<String>,
    pub extra_blocked_ipv4_ranges: Vec<(String, String)>,
    pub extra_blocked_cidrs: Vec<String>,
}

impl GuardConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, Error> {
        toml::from_str(input).map_err(|e| Error::config(e.to_string()))
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let dns_timeout_ms = match lookup(ENV_DNS_TIMEOUT_MS) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                Error::config(format!("{ENV_DNS_TIMEOUT_MS}={raw:?}: {e}"))
            })?),
            None => None,
        };

        Ok(Self {
            dns_timeout_ms,
            extra_blocked_hostnames: csv_list(lookup(ENV_BLOCKED_HOSTS)),
            extra_blocked_suffixes: csv_list(lookup(ENV_BLOCKED_SUFFIXES)),
            extra_blocked_cidrs: csv_list(lookup(ENV_BLOCKED_CIDRS)),
            ..Self::default()
        })
    }

    pub fn dns_timeout(&self) -> Duration {
        self.dns_timeout_ms
            .map_or(DEFAULT_DNS_TIMEOUT, Duration::from_millis)
    }

    /// The built-in rules plus every extra rule in this config.
    pub fn rule_set(&self) -> Result<RuleSet, Error> {
        let mut builder = RuleSetBuilder::from_defaults();
        for host in &self.extra_blocked_hostnames {
            builder = builder.block_host(host.as_str());
        }
        for suffix in &self.extra_blocked_suffixes {
            builder = builder.block_suffix(suffix.as_str());
        }
        for addr in &self.extra_blocked_ipv4 {
            builder = builder.block_ipv4(addr.as_str());
        }
        for addr in &self.extra_blocked_ipv6 {
            builder = builder.block_ipv6(addr.as_str());
        }
        for (start, end) in &self.extra_blocked_ipv4_ranges {
            builder = builder.block_ipv4_range(start.as_str(), end.as_str());
        }
        for cidr in &self.extra_blocked_cidrs {
            builder = builder.block_cidr(cidr.as_str());
        }
        builder.build()
    }
}

fn csv_list(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}
