//! Provenact Web Edge Library
//!
//! Security core of the marketing site and console: the allowlisted API
//! proxy, upstream origin validation, bounded JSON bodies, the shared-store
//! rate limiter and control API tokens.

pub mod body;
pub mod config;
pub mod constants;
pub mod control_api;
pub mod db;
pub mod error;
pub mod models;
pub mod origin;
pub mod proxy;
pub mod rate_limit;
pub mod routes;
pub mod security;
pub mod session;
pub mod token;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::{CredentialStore, ProxyTrust, RateLimitScope};
pub use rate_limit::{AttemptStore, RateLimiter};

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use control_api::ControlApiSettings;
use origin::OriginOptions;
use proxy::ForwardSettings;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    pub rate_limiter: RateLimiter,
    pub accounts: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Create a new AppState from configuration and the backing stores
    pub fn new(
        config: Config,
        http: reqwest::Client,
        attempts: Arc<dyn AttemptStore>,
        accounts: Arc<dyn CredentialStore>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(attempts, config.proxy_trust());
        Self {
            config,
            http,
            rate_limiter,
            accounts,
        }
    }

    fn origin_options(&self) -> OriginOptions {
        OriginOptions {
            allow_private_http: self.config.allow_private_http,
        }
    }

    pub fn forward_settings(&self) -> ForwardSettings {
        ForwardSettings {
            api_base_url: self.config.api_base_url.clone(),
            origin_options: self.origin_options(),
            timeout: self.config.upstream_timeout(),
            max_body_bytes: constants::MAX_PROXY_BODY_BYTES,
        }
    }

    pub fn control_api_settings(&self) -> ControlApiSettings {
        ControlApiSettings {
            api_base_url: self.config.api_base_url.clone(),
            origin_options: self.origin_options(),
            auth_secret: self.config.api_auth_secret.clone(),
            timeout: self.config.upstream_timeout(),
        }
    }
}

/// Build the application router with every route and request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/auth/register", post(routes::register_user))
        .route("/api/auth/login", post(routes::login))
        .route("/api/contact", post(routes::submit_contact))
        .route(
            "/api/openapi/proxy/*path",
            get(routes::openapi_proxy).post(routes::openapi_proxy),
        )
        // `*path` never matches an empty tail
        .route(
            "/api/openapi/proxy/",
            get(routes::proxy_root).post(routes::proxy_root),
        )
        .route(
            "/api/packages/:package/versions",
            get(routes::list_package_versions).post(routes::publish_package_version),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
