//! Closed address intervals for the range tables.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Net, Ipv6Net};

use crate::codec::{ipv6_to_u128, parse_ipv4};

/// An inclusive interval of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    start: u32,
    end: u32,
}

impl Ipv4Range {
    /// Build a range from two bounds, swapping them if given out of order.
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Build a range from two dotted-quad literals.
    pub fn from_literals(start: &str, end: &str) -> Option<Self> {
        Some(Self::new(parse_ipv4(start)?, parse_ipv4(end)?))
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Inclusive on both bounds.
    pub fn contains(&self, value: u32) -> bool {
        self.start <= value && value <= self.end
    }
}

impl From<Ipv4Net> for Ipv4Range {
    fn from(net: Ipv4Net) -> Self {
        Self::new(u32::from(net.network()), u32::from(net.broadcast()))
    }
}

impl fmt::Display for Ipv4Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            Ipv4Addr::from(self.start),
            Ipv4Addr::from(self.end)
        )
    }
}

/// An inclusive interval of IPv6 addresses, usually built from a CIDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv6Range {
    start: u128,
    end: u128,
}

impl Ipv6Range {
    /// Build a range from two bounds, swapping them if given out of order.
    pub fn new(a: u128, b: u128) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Build a range from `base/prefix_len` notation.
    ///
    /// Host bits beyond the prefix are cleared for `start` and set for
    /// `end`. A prefix of 0 covers the whole address space.
    pub fn from_cidr(cidr: &str) -> Option<Self> {
        let (base, prefix) = cidr.split_once('/')?;
        if base.is_empty() || prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let prefix: u32 = prefix.parse().ok()?;
        if prefix > 128 {
            return None;
        }
        let base = ipv6_to_u128(base)?;

        // u128 >> 128 overflows, so a /128 has no host bits at all.
        let host_mask = u128::MAX.checked_shr(prefix).unwrap_or(0);
        let start = base & !host_mask;
        Some(Self {
            start,
            end: start | host_mask,
        })
    }

    pub fn start(&self) -> u128 {
        self.start
    }

    pub fn end(&self) -> u128 {
        self.end
    }

    /// Inclusive on both bounds.
    pub fn contains(&self, value: u128) -> bool {
        self.start <= value && value <= self.end
    }
}

impl From<Ipv6Net> for Ipv6Range {
    fn from(net: Ipv6Net) -> Self {
        Self::new(u128::from(net.network()), u128::from(net.broadcast()))
    }
}

impl fmt::Display for Ipv6Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            Ipv6Addr::from(self.start),
            Ipv6Addr::from(self.end)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_range_swaps_bounds() {
        let range = Ipv4Range::from_literals("10.255.255.255", "10.0.0.0").unwrap();
        assert_eq!(range.start(), parse_ipv4("10.0.0.0").unwrap());
        assert_eq!(range.end(), parse_ipv4("10.255.255.255").unwrap());
    }

    #[test]
    fn test_ipv4_range_inclusive() {
        let range = Ipv4Range::from_literals("172.16.0.0", "172.31.255.255").unwrap();
        assert!(range.contains(range.start()));
        assert!(range.contains(range.end()));
        assert!(!range.contains(range.start() - 1));
        assert!(!range.contains(range.end() + 1));
    }

    #[test]
    fn test_ipv4_range_rejects_bad_literal() {
        assert!(Ipv4Range::from_literals("10.0.0", "10.255.255.255").is_none());
        assert!(Ipv4Range::from_literals("10.0.0.0", "10.256.0.0").is_none());
    }

    #[test]
    fn test_ipv4_range_from_net() {
        let net: Ipv4Net = "192.168.0.0/16".parse().unwrap();
        let range = Ipv4Range::from(net);
        assert_eq!(range, Ipv4Range::from_literals("192.168.0.0", "192.168.255.255").unwrap());
    }

    #[test]
    fn test_ipv6_range_from_cidr() {
        let range = Ipv6Range::from_cidr("fe80::/10").unwrap();
        assert_eq!(range.start(), ipv6_to_u128("fe80::").unwrap());
        assert_eq!(
            range.end(),
            ipv6_to_u128("febf:ffff:ffff:ffff:ffff:ffff:ffff:ffff").unwrap()
        );
    }

    #[test]
    fn test_ipv6_range_clears_host_bits() {
        let range = Ipv6Range::from_cidr("fc12:3456::1/7").unwrap();
        assert_eq!(range.start(), ipv6_to_u128("fc00::").unwrap());
        assert_eq!(
            range.end(),
            ipv6_to_u128("fdff:ffff:ffff:ffff:ffff:ffff:ffff:ffff").unwrap()
        );
    }

    #[test]
    fn test_ipv6_range_prefix_extremes() {
        let all = Ipv6Range::from_cidr("::/0").unwrap();
        assert_eq!(all.start(), 0);
        assert_eq!(all.end(), u128::MAX);

        let single = Ipv6Range::from_cidr("::1/128").unwrap();
        assert_eq!(single.start(), 1);
        assert_eq!(single.end(), 1);
        assert!(!single.contains(0));
        assert!(!single.contains(2));
    }

    #[test]
    fn test_ipv6_range_rejects_bad_cidr() {
        assert!(Ipv6Range::from_cidr("fe80::").is_none());
        assert!(Ipv6Range::from_cidr("fe80::/129").is_none());
        assert!(Ipv6Range::from_cidr("fe80::/-1").is_none());
        assert!(Ipv6Range::from_cidr("fe80::/").is_none());
        assert!(Ipv6Range::from_cidr("/64").is_none());
        assert!(Ipv6Range::from_cidr("zz::/64").is_none());
    }

    #[test]
    fn test_ipv6_range_from_net_matches_cidr() {
        let net: Ipv6Net = "fec0::/10".parse().unwrap();
        assert_eq!(Ipv6Range::from(net), Ipv6Range::from_cidr("fec0::/10").unwrap());
    }

    #[test]
    fn test_range_display() {
        let v4 = Ipv4Range::from_literals("127.0.0.0", "127.255.255.255").unwrap();
        assert_eq!(v4.to_string(), "127.0.0.0-127.255.255.255");
        let v6 = Ipv6Range::from_cidr("::1/128").unwrap();
        assert_eq!(v6.to_string(), "::1-::1");
    }
}
