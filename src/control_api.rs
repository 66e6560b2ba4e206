//! Bearer-authenticated calls from the console to the upstream control API.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::origin::{require_upstream_origin, OriginOptions};
use crate::token::issue_control_api_token;

/// Configuration slice needed to reach the control API
#[derive(Debug, Clone)]
pub struct ControlApiSettings {
    pub api_base_url: Option<String>,
    pub origin_options: OriginOptions,
    pub auth_secret: Option<String>,
    pub timeout: Duration,
}

/// Check a control path such as `/v1/packages/demo/versions`.
///
/// The path is appended to a trusted origin, so anything that could change
/// what it resolves to is refused: absolute URLs, empty or dot segments,
/// escapes, query strings and fragments.
pub fn is_valid_control_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/v1/") else {
        return false;
    };
    if path
        .chars()
        .any(|c| matches!(c, '%' | '?' | '#' | '\\') || c.is_whitespace() || c.is_control())
    {
        return false;
    }
    rest.split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Issue a fresh token and send one request to the control API.
///
/// Token or origin problems surface as `ControlApiMisconfigured`; an invalid
/// path or a transport failure as `ControlApi`. Nothing is sent when a check
/// fails.
pub async fn control_api_fetch(
    client: &reqwest::Client,
    settings: &ControlApiSettings,
    path: &str,
    user_id: &str,
    method: Method,
    body: Option<&Value>,
) -> Result<reqwest::Response> {
    let token = issue_control_api_token(settings.auth_secret.as_deref(), user_id)
        .map_err(|e| AppError::ControlApiMisconfigured(e.to_string()))?;

    let origin = require_upstream_origin(settings.api_base_url.as_deref(), settings.origin_options)
        .map_err(|e| AppError::ControlApiMisconfigured(e.to_string()))?;

    if !is_valid_control_path(path) {
        return Err(AppError::ControlApi(format!("rejected control path {:?}", path)));
    }

    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| AppError::ControlApiMisconfigured(e.to_string()))?;

    let mut request = client
        .request(method, format!("{}{}", origin, path))
        .header(header::AUTHORIZATION, bearer)
        .header(header::ACCEPT, "application/json")
        .timeout(settings.timeout);

    if let Some(body) = body {
        request = request.json(body);
    }

    request.send().await.map_err(|e| {
        if e.is_timeout() {
            AppError::ControlApi(format!("timed out after {:?}", settings.timeout))
        } else {
            AppError::ControlApi(e.to_string())
        }
    })
}
