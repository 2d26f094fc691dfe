//! Builder for custom rule sets.
//!
//! The built-in [`RuleSet::default`] covers the usual SSRF targets. A
//! deployment that knows about more internal names or networks can layer
//! them on top:
//!
//! ```rust
//! use fetchgate::RuleSetBuilder;
//!
//! let rules = RuleSetBuilder::from_defaults()
//!     .block_host("intranet.example.com")
//!     .block_suffix(".corp.example.com")
//!     .block_cidr("203.0.113.0/24")
//!     .build()
//!     .unwrap();
//!
//! assert!(rules.is_hostname_blocked("wiki.corp.example.com"));
//! assert!(rules.is_ipv4_blocked("203.0.113.7"));
//! ```
//!
//! The builder only adds rules. There is no way to allow an address the base
//! rules block.
//!
//! Rules are validated in [`RuleSetBuilder::build`]. An unparseable rule is an
//! error, never skipped.

use ipnet::IpNet;

use crate::blocklist::{normalize_hostname, RuleSet};
use crate::codec::{normalize_ipv6, parse_ipv4, segments_to_u128};
use crate::error::Error;
use crate::ranges::{Ipv4Range, Ipv6Range};

/// Builder for [`RuleSet`]. Each method consumes `self`.
#[derive(Debug, Clone)]
pub struct RuleSetBuilder {
    base: RuleSet,
    hosts: Vec<String>,
    suffixes: Vec<String>,
    ipv4: Vec<String>,
    ipv6: Vec<String>,
    ipv4_ranges: Vec<(String, String)>,
    cidrs: Vec<String>,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self::from_defaults()
    }
}

impl RuleSetBuilder {
    /// Start from an empty rule set.
    pub fn new() -> Self {
        Self::with_base(RuleSet::empty())
    }

    /// Start from the built-in rules.
    pub fn from_defaults() -> Self {
        Self::with_base(RuleSet::default())
    }

    fn with_base(base: RuleSet) -> Self {
        Self {
            base,
            hosts: Vec::new(),
            suffixes: Vec::new(),
            ipv4: Vec::new(),
            ipv6: Vec::new(),
            ipv4_ranges: Vec::new(),
            cidrs: Vec::new(),
        }
    }

    /// Block an exact hostname (case-insensitive, trailing dots ignored).
    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Block every hostname ending in `suffix`.
    ///
    /// The match is a plain "ends with", so include the leading dot
    /// (`.corp.example.com`) unless you mean to match partial labels.
    pub fn block_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffixes.push(suffix.into());
        self
    }

    /// Block a single IPv4 address.
    pub fn block_ipv4(mut self, addr: impl Into<String>) -> Self {
        self.ipv4.push(addr.into());
        self
    }

    /// Block a single IPv6 address, in any spelling.
    pub fn block_ipv6(mut self, addr: impl Into<String>) -> Self {
        self.ipv6.push(addr.into());
        self
    }

    /// Block an inclusive IPv4 range. Bounds may be given in either order.
    pub fn block_ipv4_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.ipv4_ranges.push((start.into(), end.into()));
        self
    }

    /// Block an IPv4 or IPv6 network in CIDR notation.
    ///
    /// # Example
    /// ```
    /// use fetchgate::RuleSetBuilder;
    ///
    /// let rules = RuleSetBuilder::new().block_cidr("2001:db8::/32").build().unwrap();
    /// assert!(rules.is_ipv6_blocked("2001:db8::1"));
    /// ```
    pub fn block_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.cidrs.push(cidr.into());
        self
    }

    /// Validate every pending rule and produce the rule set.
    pub fn build(self) -> Result<RuleSet, Error> {
        let mut rules = self.base;

        for host in self.hosts {
            let normalized = normalize_hostname(&host);
            if normalized.is_empty() {
                return Err(Error::invalid_rule(host, "empty hostname"));
            }
            rules.hostnames.insert(normalized);
        }

        for suffix in self.suffixes {
            let normalized = suffix.to_lowercase();
            if normalized.is_empty() {
                return Err(Error::invalid_rule(suffix, "empty suffix"));
            }
            if !rules.suffixes.contains(&normalized) {
                rules.suffixes.push(normalized);
            }
        }

        for addr in self.ipv4 {
            let value = parse_ipv4(&addr)
                .ok_or_else(|| Error::invalid_rule(&addr, "not a dotted-quad IPv4 address"))?;
            rules.ipv4_singletons.insert(value);
        }

        for addr in self.ipv6 {
            let segments = normalize_ipv6(&addr)
                .ok_or_else(|| Error::invalid_rule(&addr, "not an IPv6 address"))?;
            rules.ipv6_singletons.insert(segments_to_u128(segments));
        }

        for (start, end) in self.ipv4_ranges {
            let range = Ipv4Range::from_literals(&start, &end).ok_or_else(|| {
                Error::invalid_rule(format!("{start}-{end}"), "range bounds must be IPv4 addresses")
            })?;
            rules.ipv4_ranges.push(range);
        }

        for cidr in self.cidrs {
            match cidr.parse::<IpNet>() {
                Ok(IpNet::V4(net)) => rules.ipv4_ranges.push(Ipv4Range::from(net)),
                Ok(IpNet::V6(net)) => rules.ipv6_ranges.push(Ipv6Range::from(net)),
                Err(e) => return Err(Error::invalid_rule(cidr, e.to_string())),
            }
        }

        Ok(rules)
    }
}
