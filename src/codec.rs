//! Textual address codecs for IPv4 and IPv6.
//!
//! These work on raw text rather than [`std::net`] types so that every
//! spelling an attacker might submit (zone suffixes, `::` compression,
//! embedded IPv4 tails) lands on the same numeric value before any rule is
//! consulted. Every function returns `None` for input it cannot classify.

use std::iter;

/// Parse a dotted-quad IPv4 address into its big-endian 32-bit value.
///
/// Exactly four components are required, each made of 1-3 decimal digits
/// with a value no greater than 255. Signs, whitespace, hex prefixes and
/// empty components are all rejected.
pub fn parse_ipv4(text: &str) -> Option<u32> {
    let mut value: u32 = 0;
    let mut count = 0;

    for part in text.split('.') {
        count += 1;
        if count > 4 || part.is_empty() || part.len() > 3 {
            return None;
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let octet: u32 = part.parse().ok()?;
        if octet > 255 {
            return None;
        }
        value = (value << 8) | octet;
    }

    (count == 4).then_some(value)
}

/// Render a 32-bit value as a dotted quad.
pub fn format_ipv4(value: u32) -> String {
    let [a, b, c, d] = value.to_be_bytes();
    format!("{a}.{b}.{c}.{d}")
}

/// Normalize textual IPv6 into its eight 16-bit segments.
///
/// Handles a `%zone` suffix, mixed case, a trailing embedded IPv4 address
/// and a single `::` compression marker.
pub fn normalize_ipv6(text: &str) -> Option<[u16; 8]> {
    let lower = strip_zone(text).to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }

    let expanded = if lower.contains('.') {
        expand_embedded_ipv4(&lower)?
    } else {
        lower
    };

    if expanded == "::" {
        return Some([0; 8]);
    }

    let groups: Vec<&str> = match expanded.split_once("::") {
        Some((head, tail)) => {
            if tail.contains("::") {
                return None;
            }
            let head = split_groups(head)?;
            let tail = split_groups(tail)?;
            let missing = 8usize.checked_sub(head.len() + tail.len())?;
            head.into_iter()
                .chain(iter::repeat("0").take(missing))
                .chain(tail)
                .collect()
        }
        None => split_groups(&expanded)?,
    };

    if groups.len() != 8 {
        return None;
    }

    let mut segments = [0u16; 8];
    for (slot, group) in segments.iter_mut().zip(&groups) {
        *slot = parse_hextet(group)?;
    }
    Some(segments)
}

/// Concatenate eight segments into one 128-bit value, most significant first.
pub fn segments_to_u128(segments: [u16; 8]) -> u128 {
    segments
        .iter()
        .fold(0u128, |acc, &segment| (acc << 16) | u128::from(segment))
}

/// Normalize textual IPv6 straight to its 128-bit value.
pub fn ipv6_to_u128(text: &str) -> Option<u128> {
    normalize_ipv6(text).map(segments_to_u128)
}

/// Detect an IPv4-mapped IPv6 address (`::ffff:a.b.c.d`) and return the
/// embedded IPv4 address in dotted-quad form.
///
/// Any other shape, including the deprecated IPv4-compatible `::a.b.c.d`
/// form, returns `None`.
pub fn extract_mapped_ipv4(text: &str) -> Option<String> {
    let segments = normalize_ipv6(text)?;
    mapped_ipv4(&segments).map(format_ipv4)
}

/// The IPv4 value hidden in a `::ffff:0:0/96` address, if any.
pub(crate) fn mapped_ipv4(segments: &[u16; 8]) -> Option<u32> {
    if segments[..5].iter().all(|&s| s == 0) && segments[5] == 0xffff {
        Some((u32::from(segments[6]) << 16) | u32::from(segments[7]))
    } else {
        None
    }
}

fn strip_zone(text: &str) -> &str {
    text.split_once('%').map_or(text, |(addr, _)| addr)
}

/// Replace a trailing dotted-quad with the two hextets it encodes.
fn expand_embedded_ipv4(ip: &str) -> Option<String> {
    let last_colon = ip.rfind(':')?;
    let (prefix, tail) = (&ip[..last_colon], &ip[last_colon + 1..]);
    let value = parse_ipv4(tail)?;
    let high = value >> 16;
    let low = value & 0xffff;
    Some(format!("{prefix}:{high:x}:{low:x}"))
}

/// Split one side of a `::` into groups. Empty groups are malformed.
fn split_groups(part: &str) -> Option<Vec<&str>> {
    if part.is_empty() {
        return Some(Vec::new());
    }
    let groups: Vec<&str> = part.split(':').collect();
    if groups.iter().any(|g| g.is_empty()) {
        return None;
    }
    Some(groups)
}

fn parse_hextet(group: &str) -> Option<u16> {
    if group.is_empty() || group.len() > 4 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(group, 16).ok()
}
