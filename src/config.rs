use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_SESSION_TTL_SECS, DEFAULT_TRUST_PROXY_HOPS, DEFAULT_UPSTREAM_TIMEOUT_SECS,
    MAX_TRUST_PROXY_HOPS, MAX_UPSTREAM_TIMEOUT_SECS, MIN_SESSION_SECRET_BYTES,
};
use crate::models::rate_limit::ProxyTrust;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// Raw upstream origin; validated on every use, never trusted as-is
    pub api_base_url: Option<String>,
    pub allow_private_http: bool,
    /// Control API token signing secret; validated on every use
    pub api_auth_secret: Option<String>,
    pub upstream_timeout_secs: u64,
    pub trust_proxy_headers: bool,
    pub trust_proxy_hops: usize,
    pub session_secret: String,
    pub session_ttl_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let api_base_url = env::var("PROVENACT_API_BASE_URL").ok();
        let allow_private_http = parse_flag(env::var("PROVENACT_API_ALLOW_PRIVATE_HTTP").ok());
        let api_auth_secret = env::var("PROVENACT_API_AUTH_SECRET").ok();
        let upstream_timeout_secs =
            parse_upstream_timeout(env::var("PROVENACT_API_TIMEOUT_SECS").ok());

        let trust_proxy_headers = parse_flag(env::var("TRUST_PROXY_HEADERS").ok());
        let trust_proxy_hops = parse_trust_proxy_hops(env::var("TRUST_PROXY_HOPS").ok());

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set for console sessions")?;
        if session_secret.trim().len() < MIN_SESSION_SECRET_BYTES {
            return Err(format!(
                "SESSION_SECRET must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            ));
        }

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_SESSION_TTL_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid SESSION_TTL_SECS")?;

        Ok(Config {
            server_host,
            server_port,
            database_url,
            allowed_origins,
            environment,
            api_base_url,
            allow_private_http,
            api_auth_secret,
            upstream_timeout_secs,
            trust_proxy_headers,
            trust_proxy_hops,
            session_secret,
            session_ttl_secs,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn proxy_trust(&self) -> ProxyTrust {
        ProxyTrust {
            enabled: self.trust_proxy_headers,
            hops: self.trust_proxy_hops,
        }
    }
}

fn parse_flag(raw: Option<String>) -> bool {
    matches!(
        raw.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true") | Some("1")
    )
}

/// Invalid or sub-1 values fall back to a single hop; large values are clamped.
fn parse_trust_proxy_hops(raw: Option<String>) -> usize {
    match raw.and_then(|v| v.trim().parse::<usize>().ok()) {
        Some(hops) if hops >= 1 => hops.min(MAX_TRUST_PROXY_HOPS),
        _ => DEFAULT_TRUST_PROXY_HOPS,
    }
}

fn parse_upstream_timeout(raw: Option<String>) -> u64 {
    match raw.and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(secs) if secs >= 1 => secs.min(MAX_UPSTREAM_TIMEOUT_SECS),
        _ => DEFAULT_UPSTREAM_TIMEOUT_SECS,
    }
}
