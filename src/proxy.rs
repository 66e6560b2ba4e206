//! Allowlisted relay from the browser to the public verification endpoints.
//!
//! Only four upstream paths are reachable, only `accept` and `content-type`
//! travel upstream, and only a handful of cache/representation headers come
//! back. Request bodies are counted as they stream so a lying
//! `content-length` cannot push more than the cap through.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Method};
use axum::response::Response;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::body::declared_content_length;
use crate::error::{AppError, Result};
use crate::origin::{normalize_upstream_origin, OriginOptions};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every upstream path an anonymous caller can reach
pub const ALLOWED_PROXY_PATHS: [&str; 4] = [
    "healthz",
    "v1/hash/sha256",
    "v1/verify/manifest",
    "v1/verify/receipt",
];

static FORWARDED_REQUEST_HEADERS: [HeaderName; 2] = [header::ACCEPT, header::CONTENT_TYPE];

static FORWARDED_RESPONSE_HEADERS: [HeaderName; 6] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CACHE_CONTROL,
    header::ETAG,
    header::LAST_MODIFIED,
    header::VARY,
];

/// Map path segments onto an allowlisted upstream path.
///
/// Segments arrive undecoded. `%` is rejected outright so encoded dots or
/// slashes can never be reinterpreted further along.
pub fn normalize_proxy_path<S: AsRef<str>>(segments: &[S]) -> Option<&'static str> {
    if segments.is_empty() || segments.iter().any(|s| s.as_ref().is_empty()) {
        return None;
    }

    let joined = segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join("/");
    if joined.contains("..") || joined.contains('\\') || joined.contains('%') {
        return None;
    }

    ALLOWED_PROXY_PATHS.iter().copied().find(|p| *p == joined)
}

/// Copy only the request headers the upstream needs. Cookies and
/// authorization never leave this process.
pub fn build_upstream_headers(incoming: &HeaderMap) -> HeaderMap {
    copy_allowlisted(incoming, &FORWARDED_REQUEST_HEADERS)
}

/// Copy only representation and cache headers back to the client.
pub fn build_client_response_headers(upstream: &HeaderMap) -> HeaderMap {
    copy_allowlisted(upstream, &FORWARDED_RESPONSE_HEADERS)
}

fn copy_allowlisted(source: &HeaderMap, allowlist: &[HeaderName]) -> HeaderMap {
    let mut out = HeaderMap::new();
    for name in allowlist {
        if let Some(value) = source.get(name) {
            if !value.is_empty() {
                out.insert(name.clone(), value.clone());
            }
        }
    }
    out
}

#[derive(Debug, thiserror::Error)]
#[error("request body exceeded {limit} bytes")]
struct BodyLimitExceeded {
    limit: usize,
}

/// Wrap a body so the stream errors out the moment more than `limit` bytes
/// have passed through. `tripped` records that the error was ours.
fn limit_body_stream(
    body: Body,
    limit: usize,
    tripped: Arc<AtomicBool>,
) -> impl Stream<Item = std::result::Result<Bytes, BoxError>> + Send + 'static {
    let mut seen: usize = 0;
    body.into_data_stream().map(move |chunk| {
        let chunk = chunk.map_err(|e| Box::new(e) as BoxError)?;
        seen = seen.saturating_add(chunk.len());
        if seen > limit {
            tripped.store(true, Ordering::SeqCst);
            return Err(Box::new(BodyLimitExceeded { limit }) as BoxError);
        }
        Ok(chunk)
    })
}

/// Everything the forwarder needs from process configuration
#[derive(Debug, Clone)]
pub struct ForwardSettings {
    pub api_base_url: Option<String>,
    pub origin_options: OriginOptions,
    pub timeout: Duration,
    pub max_body_bytes: usize,
}

/// One inbound call to relay
pub struct ForwardRequest<'a, S: AsRef<str>> {
    pub method: Method,
    pub segments: &'a [S],
    pub query: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub body: Body,
}

/// Relay one request upstream and stream the filtered response back.
pub async fn forward<S: AsRef<str>>(
    client: &reqwest::Client,
    settings: &ForwardSettings,
    request: ForwardRequest<'_, S>,
) -> Result<Response> {
    let origin = normalize_upstream_origin(settings.api_base_url.as_deref(), settings.origin_options)
        .ok_or_else(|| AppError::Configuration("API base URL not configured or invalid".to_string()))?;

    let path = normalize_proxy_path(request.segments).ok_or(AppError::PathNotAllowed)?;

    if let Some(declared) = declared_content_length(request.headers) {
        if declared > settings.max_body_bytes as u64 {
            return Err(AppError::PayloadTooLarge);
        }
    }

    let url = origin.join(path, request.query);
    let carries_body = !matches!(request.method, Method::GET | Method::HEAD);
    let tripped = Arc::new(AtomicBool::new(false));

    let mut outbound = client
        .request(request.method.clone(), &url)
        .headers(build_upstream_headers(request.headers))
        .timeout(settings.timeout);

    if carries_body {
        let guarded = limit_body_stream(request.body, settings.max_body_bytes, tripped.clone());
        outbound = outbound.body(reqwest::Body::wrap_stream(guarded));
    }

    tracing::debug!(method = %request.method, path = path, "Forwarding proxy request");

    let upstream = match outbound.send().await {
        Ok(resp) => resp,
        Err(e) => {
            if tripped.load(Ordering::SeqCst) {
                tracing::warn!(path = path, "Proxy request body exceeded limit mid-stream");
                return Err(AppError::PayloadTooLarge);
            }
            if e.is_timeout() {
                return Err(AppError::Upstream(format!("timed out after {:?}", settings.timeout)));
            }
            return Err(AppError::Upstream(e.to_string()));
        }
    };

    let status = upstream.status();
    let headers = build_client_response_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
