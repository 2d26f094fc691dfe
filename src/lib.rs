//! # fetchgate
//!
//! SSRF guard for server-side fetches of user-supplied URLs.
//!
//! `fetchgate` decides whether a URL is safe for the server to fetch: http(s)
//! only, no internal hostnames, and every address the host resolves to must
//! lie outside loopback, private, link-local, multicast and reserved space
//! and away from cloud metadata endpoints. It does not make HTTP requests
//! itself.
//!
//! Every failure (unparseable URL, DNS error or timeout, unparseable address)
//! counts as a denial.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), fetchgate::Error> {
//! fetchgate::assert_url_allowed_for_fetch("https://example.com/recipe").await?;
//! // safe to fetch
//! # Ok(())
//! # }
//! ```
//!
//! For custom rules, alternate resolvers or configuration files build a
//! [`Guard`] once at startup and share it.

mod blocklist;
mod codec;
mod config;
mod error;
mod policy_builder;
mod ranges;
mod resolve;
mod safe_url;
mod validate;

pub use blocklist::{BlockReason, RuleSet};
pub use codec::{
    extract_mapped_ipv4, format_ipv4, ipv6_to_u128, normalize_ipv6, parse_ipv4, segments_to_u128,
};
pub use config::GuardConfig;
pub use error::{Error, NOT_ALLOWED_MESSAGE};
pub use policy_builder::RuleSetBuilder;
pub use ranges::{Ipv4Range, Ipv6Range};
pub use resolve::{
    resolve_host_addresses, Resolve, StaticResolver, SystemResolver, DEFAULT_DNS_TIMEOUT,
};
pub use validate::{
    assert_url_allowed_for_fetch, assert_url_allowed_for_fetch_sync, is_url_allowed_for_fetch,
    is_url_allowed_for_fetch_sync, Guard,
};
