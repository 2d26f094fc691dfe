//! Blocklists for hostnames and IP addresses.

use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock};

use crate::codec::{mapped_ipv4, normalize_ipv6, parse_ipv4, segments_to_u128};
use crate::ranges::{Ipv4Range, Ipv6Range};

/// Hostnames that are always blocked (checked before DNS resolution).
pub(crate) const BLOCKED_HOSTNAMES: &[&str] = &[
    "localhost",
    "ip6-localhost",
    "ip6-loopback",
    "ip6-localnet",
];

pub(crate) const BLOCKED_HOST_SUFFIXES: &[&str] = &[".localhost", ".local", ".internal"];

pub(crate) const BLOCKED_IPV4_SINGLETONS: &[&str] = &[
    "169.254.169.254", // AWS & GCP metadata
    "169.254.169.253", // Azure metadata
    "100.100.100.200", // Alibaba metadata
];

pub(crate) const BLOCKED_IPV6_SINGLETONS: &[&str] = &[
    "fd00:ec2::254", // AWS IPv6 metadata
];

pub(crate) const BLOCKED_IPV4_RANGES: &[(&str, &str)] = &[
    ("0.0.0.0", "0.255.255.255"),
    ("10.0.0.0", "10.255.255.255"),
    ("100.64.0.0", "100.127.255.255"),
    ("127.0.0.0", "127.255.255.255"),
    ("169.254.0.0", "169.254.255.255"),
    ("172.16.0.0", "172.31.255.255"),
    ("192.168.0.0", "192.168.255.255"),
    ("198.18.0.0", "198.19.255.255"),
    ("224.0.0.0", "239.255.255.255"),
    ("240.0.0.0", "255.255.255.255"),
];

pub(crate) const BLOCKED_IPV6_CIDRS: &[&str] = &[
    "::/128",    // unspecified
    "::1/128",   // loopback
    "fc00::/7",  // unique local
    "fe80::/10", // link-local
    "fec0::/10", // site-local, deprecated but often routed internally
];

static DEFAULT_RULES: LazyLock<Arc<RuleSet>> = LazyLock::new(|| Arc::new(RuleSet::default()));

/// Which rule matched a hostname or address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    EmptyHostname,
    Hostname(String),
    HostnameSuffix(String),
    Singleton(IpAddr),
    Ipv4Range(Ipv4Range),
    Ipv6Range(Ipv6Range),
    /// Input that could not be parsed as an address.
    Malformed,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyHostname => f.write_str("empty hostname"),
            Self::Hostname(host) => write!(f, "hostname {host} is blocked"),
            Self::HostnameSuffix(suffix) => write!(f, "hostnames ending in {suffix} are blocked"),
            Self::Singleton(ip) => write!(f, "address {ip} is blocked"),
            Self::Ipv4Range(range) => write!(f, "address in blocked range {range}"),
            Self::Ipv6Range(range) => write!(f, "address in blocked range {range}"),
            Self::Malformed => f.write_str("address could not be parsed"),
        }
    }
}

/// The complete set of hostname and address rules.
///
/// A `RuleSet` is built once and never mutated afterwards; share it with
/// [`Arc`]. An address is safe only if it matches none of the rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub(crate) hostnames: HashSet<String>,
    pub(crate) suffixes: Vec<String>,
    pub(crate) ipv4_singletons: HashSet<u32>,
    pub(crate) ipv6_singletons: HashSet<u128>,
    pub(crate) ipv4_ranges: Vec<Ipv4Range>,
    pub(crate) ipv6_ranges: Vec<Ipv6Range>,
}

impl Default for RuleSet {
    /// The built-in rules: loopback, private, link-local, CGNAT, benchmark,
    /// multicast and reserved space plus the cloud metadata endpoints.
    fn default() -> Self {
        Self {
            hostnames: BLOCKED_HOSTNAMES.iter().map(|h| h.to_string()).collect(),
            suffixes: BLOCKED_HOST_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            ipv4_singletons: BLOCKED_IPV4_SINGLETONS
                .iter()
                .filter_map(|ip| parse_ipv4(ip))
                .collect(),
            ipv6_singletons: BLOCKED_IPV6_SINGLETONS
                .iter()
                .filter_map(|ip| normalize_ipv6(ip).map(segments_to_u128))
                .collect(),
            ipv4_ranges: BLOCKED_IPV4_RANGES
                .iter()
                .filter_map(|(start, end)| Ipv4Range::from_literals(start, end))
                .collect(),
            ipv6_ranges: BLOCKED_IPV6_CIDRS
                .iter()
                .filter_map(|cidr| Ipv6Range::from_cidr(cidr))
                .collect(),
        }
    }
}

impl RuleSet {
    /// A rule set that blocks nothing. Start here with
    /// [`RuleSetBuilder::new`](crate::RuleSetBuilder::new) for fully custom tables.
    pub fn empty() -> Self {
        Self {
            hostnames: HashSet::new(),
            suffixes: Vec::new(),
            ipv4_singletons: HashSet::new(),
            ipv6_singletons: HashSet::new(),
            ipv4_ranges: Vec::new(),
            ipv6_ranges: Vec::new(),
        }
    }

    /// The process-wide default rules, built on first use.
    pub fn shared_default() -> Arc<RuleSet> {
        Arc::clone(&DEFAULT_RULES)
    }

    pub fn ipv4_ranges(&self) -> &[Ipv4Range] {
        &self.ipv4_ranges
    }

    pub fn ipv6_ranges(&self) -> &[Ipv6Range] {
        &self.ipv6_ranges
    }

    /// Check a hostname from its text alone, without any network I/O.
    ///
    /// The name is lowercased and trailing dots are removed. An empty name
    /// is blocked.
    pub fn is_hostname_blocked(&self, host: &str) -> bool {
        self.hostname_block_reason(host).is_some()
    }

    pub fn hostname_block_reason(&self, host: &str) -> Option<BlockReason> {
        let lower = normalize_hostname(host);
        if lower.is_empty() {
            return Some(BlockReason::EmptyHostname);
        }
        if self.hostnames.contains(&lower) {
            return Some(BlockReason::Hostname(lower));
        }
        self.suffixes
            .iter()
            .find(|suffix| lower.ends_with(suffix.as_str()))
            .map(|suffix| BlockReason::HostnameSuffix(suffix.clone()))
    }

    /// Check a dotted-quad IPv4 literal. Malformed input is blocked.
    pub fn is_ipv4_blocked(&self, addr: &str) -> bool {
        match parse_ipv4(addr) {
            Some(value) => self.ipv4_block_reason(value).is_some(),
            None => true,
        }
    }

    /// Check a textual IPv6 address. IPv4-mapped addresses are checked
    /// against the IPv4 rules. Malformed input is blocked.
    pub fn is_ipv6_blocked(&self, addr: &str) -> bool {
        match normalize_ipv6(addr) {
            Some(segments) => self.ipv6_block_reason(&segments).is_some(),
            None => true,
        }
    }

    /// Check an address that is already in typed form.
    pub fn is_ip_blocked(&self, ip: IpAddr) -> bool {
        self.ip_block_reason(ip).is_some()
    }

    pub fn ip_block_reason(&self, ip: IpAddr) -> Option<BlockReason> {
        match ip {
            IpAddr::V4(v4) => self.ipv4_block_reason(u32::from(v4)),
            IpAddr::V6(v6) => self.ipv6_block_reason(&v6.segments()),
        }
    }

    /// Check a textual address of either family. Anything that is neither a
    /// dotted quad nor IPv6 is blocked.
    pub fn address_block_reason(&self, addr: &str) -> Option<BlockReason> {
        if let Some(value) = parse_ipv4(addr) {
            return self.ipv4_block_reason(value);
        }
        match normalize_ipv6(addr) {
            Some(segments) => self.ipv6_block_reason(&segments),
            None => Some(BlockReason::Malformed),
        }
    }

    fn ipv4_block_reason(&self, value: u32) -> Option<BlockReason> {
        if self.ipv4_singletons.contains(&value) {
            return Some(BlockReason::Singleton(IpAddr::V4(Ipv4Addr::from(value))));
        }
        self.ipv4_ranges
            .iter()
            .find(|range| range.contains(value))
            .map(|range| BlockReason::Ipv4Range(*range))
    }

    fn ipv6_block_reason(&self, segments: &[u16; 8]) -> Option<BlockReason> {
        let value = segments_to_u128(*segments);
        if self.ipv6_singletons.contains(&value) {
            return Some(BlockReason::Singleton(IpAddr::V6(Ipv6Addr::from(value))));
        }

        // ::ffff:a.b.c.d must answer to the IPv4 rules, or a blocked IPv4
        // target could be reached through the IPv6 address family.
        if let Some(v4) = mapped_ipv4(segments) {
            return self.ipv4_block_reason(v4);
        }

        self.ipv6_ranges
            .iter()
            .find(|range| range.contains(value))
            .map(|range| BlockReason::Ipv6Range(*range))
    }
}

pub(crate) fn normalize_hostname(host: &str) -> String {
    host.trim_end_matches('.').to_lowercase()
}
