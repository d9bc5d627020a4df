//! Syntactic validation of lookup input.
//!
//! Validation failures block submission with a [`crate::Error::Validation`]
//! and no network call is made.
//!
//! The IPv6 pattern accepts only the full eight-group notation and rejects
//! the compressed `::` form. Backend compatibility with the shorthand is
//! unknown, so the restriction is kept as-is.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

static IPV6_RE: OnceLock<Regex> = OnceLock::new();
static HOSTNAME_RE: OnceLock<Regex> = OnceLock::new();

/// Maximum total length of a hostname, per RFC 1035.
const MAX_HOSTNAME_LEN: usize = 253;

/// Which address family a validated IP string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpKind {
    V4,
    V6,
}

impl std::fmt::Display for IpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V4 => write!(f, "IPv4"),
            Self::V6 => write!(f, "IPv6"),
        }
    }
}

/// Check whether `s` is a valid dotted-quad IPv4 address.
///
/// Four dot-separated decimal octets, each in 0..=255. Leading zeros are
/// tolerated.
#[must_use]
pub fn is_valid_ipv4(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|part| {
        !part.is_empty()
            && part.len() <= 3
            && part.bytes().all(|b| b.is_ascii_digit())
            && part.parse::<u16>().map_or(false, |octet| octet <= 255)
    })
}

/// Check whether `s` is a valid full-notation IPv6 address.
///
/// Eight colon-separated groups of 1-4 hex digits. Compressed `::`
/// notation is rejected.
#[must_use]
pub fn is_valid_ipv6(s: &str) -> bool {
    let re = IPV6_RE.get_or_init(|| {
        Regex::new(r"^([0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4}$").expect("invalid IPv6 pattern")
    });
    re.is_match(s)
}

/// Check whether `s` is a plausibly valid hostname.
///
/// Dot-separated labels of letters, digits and hyphens, where no label
/// starts or ends with a hyphen. A single trailing dot is tolerated.
#[must_use]
pub fn is_valid_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() || s.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    let re = HOSTNAME_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
            .expect("invalid hostname pattern")
    });
    re.is_match(s)
}

/// Validate an IP address of either family.
///
/// # Errors
///
/// Returns a `Validation` error when `s` is neither a valid IPv4 nor a
/// valid full-notation IPv6 address.
pub fn validate_ip(s: &str) -> Result<IpKind> {
    let s = s.trim();
    if is_valid_ipv4(s) {
        return Ok(IpKind::V4);
    }
    if is_valid_ipv6(s) {
        return Ok(IpKind::V6);
    }
    Err(Error::validation(format!(
        "'{s}' is not a valid IP address"
    )))
}

/// Validate a hostname.
///
/// # Errors
///
/// Returns a `Validation` error when `s` is not a syntactically valid
/// hostname.
pub fn validate_hostname(s: &str) -> Result<&str> {
    let s = s.trim();
    if is_valid_hostname(s) {
        Ok(s)
    } else {
        Err(Error::validation(format!("'{s}' is not a valid hostname")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_in_range_quads_accepted() {
        for s in ["0.0.0.0", "8.8.8.8", "192.168.1.1", "255.255.255.255", "1.22.133.244"] {
            assert!(is_valid_ipv4(s), "{s} should be valid");
        }
    }

    #[test]
    fn test_ipv4_out_of_range_octet_rejected() {
        for s in ["256.1.1.1", "1.256.1.1", "1.1.999.1", "1.1.1.300"] {
            assert!(!is_valid_ipv4(s), "{s} should be invalid");
        }
    }

    #[test]
    fn test_ipv4_wrong_segment_count_rejected() {
        for s in ["1.2.3", "1.2.3.4.5", "1.2..4", "1.2.3.", "", "1234"] {
            assert!(!is_valid_ipv4(s), "{s} should be invalid");
        }
    }

    #[test]
    fn test_ipv4_non_numeric_rejected() {
        assert!(!is_valid_ipv4("a.b.c.d"));
        assert!(!is_valid_ipv4("1.2.3.x"));
        assert!(!is_valid_ipv4("1.2.3.-4"));
    }

    #[test]
    fn test_ipv6_full_notation_accepted() {
        assert!(is_valid_ipv6("2001:0db8:0000:0000:0000:ff00:0042:8329"));
        assert!(is_valid_ipv6("fe80:0:0:0:0:0:0:1"));
        assert!(is_valid_ipv6("2606:4700:4700:1111:2222:3333:4444:1001"));
    }

    #[test]
    fn test_ipv6_compressed_form_rejected() {
        // Full-notation only; the shorthand is deliberately not accepted.
        assert!(!is_valid_ipv6("::1"));
        assert!(!is_valid_ipv6("2001:db8::ff00:42:8329"));
        assert!(!is_valid_ipv6("::"));
    }

    #[test]
    fn test_ipv6_malformed_rejected() {
        assert!(!is_valid_ipv6("2001:db8:0:0:0:ff00:42"));
        assert!(!is_valid_ipv6("2001:db8:0:0:0:ff00:42:8329:1"));
        assert!(!is_valid_ipv6("2001:db8:0:0:0:ff00:42:g329"));
        assert!(!is_valid_ipv6("8.8.8.8"));
    }

    #[test]
    fn test_hostname_accepted() {
        for s in ["example.com", "a.b.c.d.example.co.uk", "localhost", "my-host.example.com", "example.com."] {
            assert!(is_valid_hostname(s), "{s} should be valid");
        }
    }

    #[test]
    fn test_hostname_rejected() {
        for s in ["", "-bad.example.com", "bad-.example.com", "exa mple.com", "ex..com"] {
            assert!(!is_valid_hostname(s), "{s} should be invalid");
        }
        assert!(!is_valid_hostname(&"a.".repeat(200)));
    }

    #[test]
    fn test_validate_ip_kind() {
        assert_eq!(validate_ip("8.8.8.8").unwrap(), IpKind::V4);
        assert_eq!(
            validate_ip("2001:0db8:0000:0000:0000:ff00:0042:8329").unwrap(),
            IpKind::V6
        );
        assert!(validate_ip("not-an-ip").is_err());
        assert!(validate_ip("::1").is_err());
    }

    #[test]
    fn test_validate_trims_whitespace() {
        assert_eq!(validate_ip("  8.8.8.8 ").unwrap(), IpKind::V4);
        assert_eq!(validate_hostname(" example.com ").unwrap(), "example.com");
    }
}
