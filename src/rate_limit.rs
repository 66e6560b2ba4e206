//! Sliding-window rate limiting for the auth flows.
//!
//! State lives only in the shared store. Handlers stay stateless, and the
//! store's transaction plus a per-key advisory lock make check-and-record
//! atomic across every instance.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::constants::{RATE_LIMIT_LOCK_TIMEOUT_MS, RATE_LIMIT_WINDOW_SECS};
use crate::error::Result;
use crate::models::rate_limit::{build_rate_limit_key, ProxyTrust, RateLimitScope};
use crate::security::hash_rate_limit_key;

/// Durable attempt log shared by every handler instance
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Atomically prune attempts older than `window`, count what is left and,
    /// when below `max_attempts`, record a new attempt.
    ///
    /// Returns `true` when the key is limited (nothing recorded).
    async fn check_and_record(
        &self,
        scope: RateLimitScope,
        key_hash: &str,
        max_attempts: i64,
        window: Duration,
    ) -> Result<bool>;

    /// Connectivity check used by the health route
    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn AttemptStore>,
    trust: ProxyTrust,
    window: Duration,
    timeout: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn AttemptStore>, trust: ProxyTrust) -> Self {
        Self {
            store,
            trust,
            window: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
            // Leave room for pool acquisition on top of the in-transaction lock timeout
            timeout: Duration::from_millis(RATE_LIMIT_LOCK_TIMEOUT_MS * 2),
        }
    }

    pub fn store(&self) -> &Arc<dyn AttemptStore> {
        &self.store
    }

    /// Check and record an attempt. Fails closed: any store error or timeout
    /// reports the caller as limited.
    pub async fn is_limited(
        &self,
        scope: RateLimitScope,
        headers: &HeaderMap,
        email: Option<&str>,
    ) -> bool {
        let key = hash_rate_limit_key(&build_rate_limit_key(headers, email, self.trust));

        let check = self
            .store
            .check_and_record(scope, &key, scope.max_attempts(), self.window);

        match tokio::time::timeout(self.timeout, check).await {
            Ok(Ok(limited)) => {
                if limited {
                    tracing::warn!(scope = ?scope, key = %key, "Rate limit exceeded");
                }
                limited
            }
            Ok(Err(e)) => {
                tracing::error!(scope = ?scope, key = %key, "Rate limit check failed, failing closed: {}", e);
                true
            }
            Err(_) => {
                tracing::error!(scope = ?scope, key = %key, "Rate limit check timed out, failing closed");
                true
            }
        }
    }
}
