use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::body::read_json_body;
use crate::constants::{
    ERR_INVALID_JSON_BODY, ERR_INVALID_PACKAGE_NAME, MAX_PACKAGE_VERSIONS_BODY_BYTES,
};
use crate::control_api::control_api_fetch;
use crate::error::{AppError, Result};
use crate::routes::validation::is_valid_package_name;
use crate::session::SessionUser;
use crate::AppState;

fn versions_path(package: &str) -> Result<String> {
    if !is_valid_package_name(package) {
        return Err(AppError::InvalidInput(ERR_INVALID_PACKAGE_NAME.to_string()));
    }
    Ok(format!("/v1/packages/{}/versions", package))
}

/// Relay the control API's JSON and status. Non-JSON bodies are replaced.
async fn relay_json(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let payload = upstream
        .json::<Value>()
        .await
        .unwrap_or_else(|_| json!({ "error": "Unexpected response" }));
    (status, Json(payload)).into_response()
}

/// GET /api/packages/:package/versions
pub async fn list_package_versions(
    State(state): State<AppState>,
    session: SessionUser,
    Path(package): Path<String>,
) -> Result<Response> {
    let path = versions_path(&package)?;

    let upstream = control_api_fetch(
        &state.http,
        &state.control_api_settings(),
        &path,
        &session.user_id,
        Method::GET,
        None,
    )
    .await?;

    Ok(relay_json(upstream).await)
}

/// POST /api/packages/:package/versions
pub async fn publish_package_version(
    State(state): State<AppState>,
    session: SessionUser,
    Path(package): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response> {
    let path = versions_path(&package)?;

    let payload = read_json_body(&headers, body, MAX_PACKAGE_VERSIONS_BODY_BYTES).await?;
    if !payload.is_object() {
        return Err(AppError::InvalidInput(ERR_INVALID_JSON_BODY.to_string()));
    }

    let upstream = control_api_fetch(
        &state.http,
        &state.control_api_settings(),
        &path,
        &session.user_id,
        Method::POST,
        Some(&payload),
    )
    .await?;

    Ok(relay_json(upstream).await)
}
