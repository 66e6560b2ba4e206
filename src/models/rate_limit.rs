use std::net::IpAddr;

use axum::http::HeaderMap;

use crate::constants::{
    LOGIN_RATE_LIMIT_MAX_ATTEMPTS, MAX_EMAIL_LENGTH_CHARS, MAX_IP_HEADER_VALUE_CHARS,
    REGISTER_RATE_LIMIT_MAX_ATTEMPTS,
};
use crate::models::account::canonical_email;

/// Which auth flow an attempt belongs to. Each scope has its own table and cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitScope {
    Register,
    Login,
}

impl RateLimitScope {
    pub fn table(self) -> &'static str {
        match self {
            RateLimitScope::Register => "auth_register_attempts",
            RateLimitScope::Login => "auth_login_attempts",
        }
    }

    pub fn max_attempts(self) -> i64 {
        match self {
            RateLimitScope::Register => REGISTER_RATE_LIMIT_MAX_ATTEMPTS,
            RateLimitScope::Login => LOGIN_RATE_LIMIT_MAX_ATTEMPTS,
        }
    }
}

/// Whether and how far to trust `x-forwarded-for` style headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyTrust {
    pub enabled: bool,
    /// Number of trusted proxies in front of us (1..=5)
    pub hops: usize,
}

impl Default for ProxyTrust {
    fn default() -> Self {
        Self {
            enabled: false,
            hops: 1,
        }
    }
}

/// Build the plaintext rate-limit key for a request.
///
/// Forms: `ip:<ip>|email:<email>`, `ip:<ip>`, `email:<email>` or `global`.
/// The value is hashed before it reaches the store.
pub fn build_rate_limit_key(headers: &HeaderMap, email: Option<&str>, trust: ProxyTrust) -> String {
    let ip = request_ip(headers, trust);
    let email = email.and_then(normalize_email);

    match (ip, email) {
        (Some(ip), Some(email)) => format!("ip:{}|email:{}", ip, email),
        (Some(ip), None) => format!("ip:{}", ip),
        (None, Some(email)) => format!("email:{}", email),
        (None, None) => "global".to_string(),
    }
}

/// Email component of the key. Oversized input is dropped rather than
/// truncated so it cannot collide with a real address.
pub fn normalize_email(email: &str) -> Option<String> {
    canonical_email(email).filter(|e| e.chars().count() <= MAX_EMAIL_LENGTH_CHARS)
}

/// Resolve the client IP from proxy headers, if trusted.
///
/// The entry `hops` positions from the right of `x-forwarded-for` is the
/// address our nearest trusted proxy saw. Left-hand entries are client
/// supplied and are never read. If the chain is missing, too short, or any
/// of the trusted right-hand entries is not an IP, fall back to the
/// single-value headers.
fn request_ip(headers: &HeaderMap, trust: ProxyTrust) -> Option<IpAddr> {
    if !trust.enabled {
        return None;
    }
    let hops = trust.hops.max(1);

    if let Some(forwarded) = forwarded_chain(headers) {
        let chain: Vec<&str> = forwarded.split(',').collect();
        if chain.len() >= hops {
            let trusted = &chain[chain.len() - hops..];
            let parsed: Option<Vec<IpAddr>> =
                trusted.iter().map(|c| normalize_ip_candidate(c)).collect();
            if let Some(ips) = parsed {
                return ips.first().copied();
            }
        }
    }

    ["x-real-ip", "cf-connecting-ip"]
        .iter()
        .filter_map(|name| header_str(headers, name))
        .find_map(normalize_ip_candidate)
}

/// All `x-forwarded-for` lines joined in arrival order. A proxy may add its
/// own line instead of appending to the client's, so reading only the first
/// line would hand the right-most slot to the client.
fn forwarded_chain(headers: &HeaderMap) -> Option<String> {
    let lines = headers
        .get_all("x-forwarded-for")
        .iter()
        .map(|v| v.to_str().ok())
        .collect::<Option<Vec<&str>>>()?;
    if lines.is_empty() {
        return None;
    }
    Some(lines.join(","))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

/// Accepts `1.2.3.4`, `1.2.3.4:port`, `[v6]`, `[v6]:port` and `v6%zone`.
fn normalize_ip_candidate(value: &str) -> Option<IpAddr> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_IP_HEADER_VALUE_CHARS {
        return None;
    }

    let mut candidate = trimmed;
    if let Some(rest) = candidate.strip_prefix('[') {
        let close = rest.find(']')?;
        if close == 0 {
            return None;
        }
        candidate = &rest[..close];
    } else if candidate.contains('.') && candidate.matches(':').count() == 1 {
        candidate = &candidate[..candidate.rfind(':')?];
    }

    if let Some(zone) = candidate.find('%') {
        if zone > 0 {
            candidate = &candidate[..zone];
        }
    }

    candidate.parse::<IpAddr>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn trusted(hops: usize) -> ProxyTrust {
        ProxyTrust {
            enabled: true,
            hops,
        }
    }

    #[test]
    fn test_untrusted_key_ignores_request_metadata() {
        let key_a = build_rate_limit_key(
            &headers(&[("user-agent", "UA-A")]),
            Some("a@x.com"),
            ProxyTrust::default(),
        );
        let key_b = build_rate_limit_key(
            &headers(&[("user-agent", "UA-B"), ("x-forwarded-for", "203.0.113.9")]),
            Some("a@x.com"),
            ProxyTrust::default(),
        );

        assert_eq!(key_a, "email:a@x.com");
        assert_eq!(key_b, "email:a@x.com");
    }

    #[test]
    fn test_global_bucket_without_ip_or_email() {
        let key = build_rate_limit_key(&headers(&[("user-agent", "UA-A")]), None, ProxyTrust::default());
        assert_eq!(key, "global");

        let key = build_rate_limit_key(&HeaderMap::new(), Some("   "), ProxyTrust::default());
        assert_eq!(key, "global");
    }

    #[test]
    fn test_email_is_trimmed_lowercased_and_bounded() {
        assert_eq!(normalize_email("  Alice@Example.COM "), Some("alice@example.com".into()));
        assert_eq!(normalize_email(""), None);
        let long = format!("{}@x.com", "a".repeat(320));
        assert_eq!(normalize_email(&long), None);
    }

    #[test]
    fn test_trusted_single_hop_uses_rightmost_entry() {
        let key = build_rate_limit_key(
            &headers(&[
                ("x-forwarded-for", "203.0.113.9, 198.51.100.12"),
                ("x-real-ip", "198.51.100.7"),
            ]),
            Some("alice@example.com"),
            trusted(1),
        );
        assert_eq!(key, "ip:198.51.100.12|email:alice@example.com");
    }

    #[test]
    fn test_trusted_two_hops() {
        let key = build_rate_limit_key(
            &headers(&[("x-forwarded-for", "203.0.113.9, 198.51.100.12, 192.0.2.3")]),
            None,
            trusted(2),
        );
        assert_eq!(key, "ip:198.51.100.12");
    }

    #[test]
    fn test_separate_proxy_header_line_wins_over_client_line() {
        let mut map = HeaderMap::new();
        map.append("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        map.append("x-forwarded-for", HeaderValue::from_static("198.51.100.12"));

        assert_eq!(build_rate_limit_key(&map, None, trusted(1)), "ip:198.51.100.12");
        assert_eq!(build_rate_limit_key(&map, None, trusted(2)), "ip:203.0.113.9");
    }

    #[test]
    fn test_client_line_cannot_pad_past_proxy_line() {
        let mut map = HeaderMap::new();
        map.append(
            "x-forwarded-for",
            HeaderValue::from_static("1.1.1.1, 2.2.2.2, 3.3.3.3"),
        );
        map.append("x-forwarded-for", HeaderValue::from_static("198.51.100.12"));

        assert_eq!(build_rate_limit_key(&map, None, trusted(1)), "ip:198.51.100.12");
    }

    #[test]
    fn test_spoofed_left_entries_are_ignored() {
        let key = build_rate_limit_key(
            &headers(&[("x-forwarded-for", "not-an-ip, 10.0.0.1, 198.51.100.12")]),
            None,
            trusted(1),
        );
        assert_eq!(key, "ip:198.51.100.12");
    }

    #[test]
    fn test_short_or_malformed_chain_falls_back_to_direct_header() {
        let key = build_rate_limit_key(
            &headers(&[("x-forwarded-for", "198.51.100.12"), ("x-real-ip", "192.0.2.44")]),
            None,
            trusted(2),
        );
        assert_eq!(key, "ip:192.0.2.44");

        let key = build_rate_limit_key(
            &headers(&[("x-forwarded-for", "garbage"), ("cf-connecting-ip", "192.0.2.45")]),
            None,
            trusted(1),
        );
        assert_eq!(key, "ip:192.0.2.45");

        let key = build_rate_limit_key(
            &headers(&[("x-forwarded-for", "garbage"), ("x-real-ip", "also garbage")]),
            Some("bob@example.com"),
            trusted(1),
        );
        assert_eq!(key, "email:bob@example.com");
    }

    #[test]
    fn test_ip_candidate_normalization() {
        assert_eq!(
            normalize_ip_candidate(" 203.0.113.9:443 "),
            Some("203.0.113.9".parse().unwrap())
        );
        assert_eq!(
            normalize_ip_candidate("[2001:db8::1]:8443"),
            Some("2001:db8::1".parse().unwrap())
        );
        assert_eq!(
            normalize_ip_candidate("fe80::1%eth0"),
            Some("fe80::1".parse().unwrap())
        );
        assert_eq!(normalize_ip_candidate("2001:db8::1"), Some("2001:db8::1".parse().unwrap()));
        assert_eq!(normalize_ip_candidate("[]"), None);
        assert_eq!(normalize_ip_candidate("unknown"), None);
        assert_eq!(normalize_ip_candidate("1.2.3.4:5:6"), None);
        assert_eq!(normalize_ip_candidate(&"1".repeat(200)), None);
    }

    #[test]
    fn test_scope_caps() {
        assert_eq!(RateLimitScope::Register.max_attempts(), 8);
        assert_eq!(RateLimitScope::Login.max_attempts(), 10);
        assert_ne!(RateLimitScope::Register.table(), RateLimitScope::Login.table());
    }
}
