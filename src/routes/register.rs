use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::body::{read_json_body, BodyError};
use crate::constants::MAX_AUTH_BODY_BYTES;
use crate::error::{AppError, Result};
use crate::models::{Credentials, RateLimitScope};
use crate::routes::validation::ensure_same_origin;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub ok: bool,
}

/// Register a new account
///
/// The attempt is counted against the `register` rate limit before any
/// validation, so malformed submissions still consume budget.
///
/// Returns 201 on success, 409 if the email is already taken.
pub async fn register_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    ensure_same_origin(&headers, &state.config.allowed_origins)?;

    let payload = match read_json_body(&headers, body, MAX_AUTH_BODY_BYTES).await {
        Ok(value) => value,
        Err(BodyError::TooLarge) => return Err(AppError::PayloadTooLarge),
        // Falls through to the email check below
        Err(BodyError::Malformed) => Value::Null,
    };
    let credentials = Credentials::from_json(&payload);
    let email = credentials.normalized_email();

    if state
        .rate_limiter
        .is_limited(RateLimitScope::Register, &headers, email.as_deref())
        .await
    {
        return Err(AppError::RateLimitExceeded);
    }

    let (email, password) = credentials
        .validate_for_registration()
        .map_err(|msg| AppError::InvalidInput(msg.to_string()))?;

    state.accounts.create_user(&email, password).await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { ok: true })))
}
