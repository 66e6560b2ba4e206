use axum::{
    body::Body,
    extract::{OriginalUri, RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};

use crate::error::{AppError, Result};
use crate::proxy::{forward, ForwardRequest};
use crate::AppState;

pub const PROXY_ROUTE_PREFIX: &str = "/api/openapi/proxy/";

/// Relay an allowlisted API call from the browser to the upstream service.
///
/// Segments are taken from the raw request path so percent-encoded slashes
/// or dots stay literal and fail the allowlist.
pub async fn openapi_proxy(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Body,
) -> Result<Response> {
    let raw_path = uri.path().strip_prefix(PROXY_ROUTE_PREFIX).unwrap_or_default();
    let segments: Vec<&str> = raw_path.split('/').collect();

    forward(
        &state.http,
        &state.forward_settings(),
        ForwardRequest {
            method,
            segments: &segments,
            query: query.as_deref(),
            headers: &headers,
            body,
        },
    )
    .await
}

/// The bare proxy prefix names no upstream path.
pub async fn proxy_root() -> AppError {
    AppError::PathNotAllowed
}
