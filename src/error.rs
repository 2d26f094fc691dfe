//! Error types for fetchgate.

use std::net::IpAddr;

use thiserror::Error;

use crate::blocklist::BlockReason;

/// The message returned to callers for every denied URL, whichever rule fired.
pub const NOT_ALLOWED_MESSAGE: &str = "This URL is not allowed for recipe import.";

/// Errors returned by the public API.
#[derive(Debug, Error)]
pub enum Error {
    /// The URL must not be fetched. The matching rule is only logged.
    #[error("This URL is not allowed for recipe import.")]
    NotAllowed,

    /// A custom rule could not be parsed.
    #[error("Invalid rule {rule:?}: {reason}")]
    InvalidRule { rule: String, reason: String },

    /// Configuration could not be read.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// DNS resolution failed.
    #[error("DNS error for {host}: {message}")]
    DnsError { host: String, message: String },
}

impl Error {
    pub(crate) fn invalid_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn dns_error(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DnsError {
            host: host.into(),
            message: message.into(),
        }
    }
}

/// Why a URL was denied. Only ever logged, never shown to callers.
#[derive(Debug, Error)]
pub(crate) enum Denial {
    #[error("malformed URL: {reason}")]
    MalformedUrl { reason: String },

    #[error("scheme '{scheme}' not allowed, only http/https")]
    UnsupportedScheme { scheme: String },

    #[error("hostname {host:?} blocked: {reason}")]
    BlockedHostname { host: String, reason: BlockReason },

    #[error("no usable addresses for {host}")]
    ResolutionFailure { host: String },

    #[error("{host} resolved to {ip}: {reason}")]
    BlockedAddress {
        host: String,
        ip: IpAddr,
        reason: BlockReason,
    },
}

impl Denial {
    /// Short label for structured logs.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::MalformedUrl { .. } => "malformed_url",
            Self::UnsupportedScheme { .. } => "unsupported_scheme",
            Self::BlockedHostname { .. } => "blocked_hostname",
            Self::ResolutionFailure { .. } => "resolution_failure",
            Self::BlockedAddress { .. } => "blocked_address",
        }
    }
}
