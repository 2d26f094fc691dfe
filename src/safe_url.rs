//! URL parsing and host extraction.

use url::{Host, Url};

use crate::error::Denial;

/// A parsed http(s) URL, before DNS resolution and address checks.
///
/// The host is kept in the form the resolver and the classifiers expect:
/// domain names as the parser normalized them (lowercase, punycode) and IP
/// literals in canonical text without IPv6 brackets.
#[derive(Debug, Clone)]
pub(crate) struct SafeUrl {
    inner: Url,
    host: String,
}

impl SafeUrl {
    /// Parse an absolute URL and require the `http` or `https` scheme.
    ///
    /// Parsing follows WHATWG URL rules, the same ones HTTP clients built on
    /// the `url` crate use. Numeric hosts in legacy notations (`0177.0.0.1`,
    /// `2130706433`, `127.1`) therefore come out as the dotted quad that
    /// would actually be connected to.
    pub(crate) fn parse(input: &str) -> Result<Self, Denial> {
        let url = Url::parse(input).map_err(|e| Denial::MalformedUrl {
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Denial::UnsupportedScheme {
                    scheme: scheme.to_string(),
                });
            }
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => String::new(),
        };

        Ok(Self { inner: url, host })
    }

    /// The host: domain name or IP literal. May be empty.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The normalized URL.
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_of(url: &str) -> String {
        SafeUrl::parse(url).unwrap().host().to_string()
    }

    // ==================== Valid URLs ====================

    #[test]
    fn test_parse_valid_urls() {
        let url = SafeUrl::parse("https://example.com/recipe").unwrap();
        assert_eq!(url.host(), "example.com");
        assert_eq!(url.as_str(), "https://example.com/recipe");

        let url = SafeUrl::parse("http://example.com:8080/path?q=1#frag").unwrap();
        assert_eq!(url.host(), "example.com");
        assert!(url.as_str().starts_with("http://example.com:8080/"));
    }

    #[test]
    fn test_hostname_lowercased() {
        assert_eq!(host_of("https://EXAMPLE.COM/path"), "example.com");
        assert_eq!(host_of("HTTPS://Example.Com/"), "example.com");
    }

    #[test]
    fn test_trailing_dot_kept_for_classifier() {
        assert_eq!(host_of("http://localhost./"), "localhost.");
    }

    #[test]
    fn test_userinfo_does_not_change_host() {
        assert_eq!(host_of("http://127.0.0.1@example.com/"), "example.com");
        assert_eq!(host_of("http://example.com@127.0.0.1/"), "127.0.0.1");
    }

    // ==================== IP literals ====================

    #[test]
    fn test_ipv4_literal() {
        assert_eq!(host_of("http://169.254.169.254/latest/meta-data/"), "169.254.169.254");
    }

    #[test]
    fn test_ipv6_literal_without_brackets() {
        assert_eq!(host_of("http://[::1]/"), "::1");
        assert_eq!(host_of("http://[::1]:8080/"), "::1");
        assert_eq!(host_of("http://[FD00:EC2::254]/"), "fd00:ec2::254");
        assert_eq!(host_of("http://[::ffff:127.0.0.1]/"), "::ffff:127.0.0.1");
    }

    #[test]
    fn test_legacy_numeric_hosts_normalized() {
        assert_eq!(host_of("http://0177.0.0.1/"), "127.0.0.1");
        assert_eq!(host_of("http://2130706433/"), "127.0.0.1");
        assert_eq!(host_of("http://0x7f000001/"), "127.0.0.1");
        assert_eq!(host_of("http://127.1/"), "127.0.0.1");
        assert_eq!(host_of("http://0xa9.0xfe.0xa9.0xfe/"), "169.254.169.254");
    }

    // ==================== Rejections ====================

    #[test]
    fn test_reject_non_http_schemes() {
        for url in [
            "ftp://example.com",
            "file:///etc/passwd",
            "gopher://example.com",
            "javascript:alert(1)",
            "data:text/html,<h1>hi</h1>",
        ] {
            assert!(
                matches!(SafeUrl::parse(url), Err(Denial::UnsupportedScheme { .. })),
                "{url}"
            );
        }
    }

    #[test]
    fn test_reject_malformed() {
        for url in ["", "example.com/recipe", "//example.com", "http://", "http://[::1/"] {
            assert!(
                matches!(SafeUrl::parse(url), Err(Denial::MalformedUrl { .. })),
                "{url}"
            );
        }
    }

    #[test]
    fn test_reject_invalid_bracketed_host() {
        assert!(SafeUrl::parse("http://[example.com]/").is_err());
        assert!(SafeUrl::parse("http://[not:valid:ipv6]/").is_err());
    }
}
