//! Upstream origin validation.
//!
//! The configured upstream base URL is treated as untrusted input. Only a
//! bare origin survives: anything carrying credentials, a path, a query or a
//! fragment is rejected outright instead of being stripped.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

/// Options controlling which origins are acceptable
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginOptions {
    /// Permit plain http to private-network and single-label hosts
    pub allow_private_http: bool,
}

/// A validated `scheme://host[:port]` origin with no other URL component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamOrigin(String);

impl UpstreamOrigin {
    /// Build an absolute URL for an already-validated path (no leading slash).
    pub fn join(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}/{}?{}", self.0, path, q),
            _ => format!("{}/{}", self.0, path),
        }
    }
}

impl fmt::Display for UpstreamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned by [`require_upstream_origin`]. The message never echoes
/// the rejected value.
#[derive(Debug, thiserror::Error)]
#[error("PROVENACT_API_BASE_URL must be configured and use https (or http on a loopback/private host when explicitly allowed)")]
pub struct InvalidOrigin;

/// Normalize a raw configuration value into an upstream origin.
///
/// Returns `None` for anything that is not a bare https origin, or an http
/// origin on an allowed local/private host.
pub fn normalize_upstream_origin(
    raw: Option<&str>,
    options: OriginOptions,
) -> Option<UpstreamOrigin> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = Url::parse(raw).ok()?;

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return None;
    }
    // Repeated slashes collapse to the root; any other path is a misconfiguration
    if !parsed.path().chars().all(|c| c == '/') {
        return None;
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return None;
    }

    let host = parsed.host()?;
    let allowed = match parsed.scheme() {
        "https" => true,
        "http" => is_always_allowed_http(&host) || (options.allow_private_http && is_private_host(&host)),
        _ => false,
    };
    if !allowed {
        return None;
    }

    let origin = parsed.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(UpstreamOrigin(origin.ascii_serialization()))
}

/// Like [`normalize_upstream_origin`] but fails with a fixed message.
pub fn require_upstream_origin(
    raw: Option<&str>,
    options: OriginOptions,
) -> Result<UpstreamOrigin, InvalidOrigin> {
    normalize_upstream_origin(raw, options).ok_or(InvalidOrigin)
}

/// Local development hosts are accepted over http without any opt-in.
fn is_always_allowed_http(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(addr) => *addr == Ipv4Addr::LOCALHOST,
        Host::Ipv6(_) => false,
    }
}

fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        // Single-label names are typical of container and service-mesh DNS
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost") || !domain.contains('.'),
        Host::Ipv4(addr) => is_private_ipv4(*addr),
        Host::Ipv6(addr) => *addr == Ipv6Addr::LOCALHOST,
    }
}

fn is_private_ipv4(addr: Ipv4Addr) -> bool {
    let [a, b, _, _] = addr.octets();
    addr.is_loopback()
        || a == 10
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
        || (a == 169 && b == 254)
        || (a == 100 && (64..=127).contains(&b))
}
