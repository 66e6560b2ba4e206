use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::body::read_json_body;
use crate::constants::{
    ERR_CREDENTIALS_REQUIRED, MAX_AUTH_BODY_BYTES, MAX_EMAIL_LENGTH_CHARS,
    MAX_PASSWORD_LENGTH_CHARS,
};
use crate::error::{AppError, Result};
use crate::models::{Credentials, RateLimitScope};
use crate::session::{issue_session, session_cookie_header};
use crate::AppState;

/// Exchange email and password for a console session cookie
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse> {
    let payload = read_json_body(&headers, body, MAX_AUTH_BODY_BYTES).await?;
    let credentials = Credentials::from_json(&payload);

    let (Some(email), Some(password)) = (
        credentials.normalized_email(),
        credentials.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::InvalidInput(ERR_CREDENTIALS_REQUIRED.to_string()));
    };

    if state
        .rate_limiter
        .is_limited(RateLimitScope::Login, &headers, Some(&email))
        .await
    {
        return Err(AppError::RateLimitExceeded);
    }

    // Oversized input can never match a stored account
    if email.chars().count() > MAX_EMAIL_LENGTH_CHARS
        || password.chars().count() > MAX_PASSWORD_LENGTH_CHARS
    {
        return Err(AppError::InvalidCredentials);
    }

    let user_id = state
        .accounts
        .verify_credentials(&email, password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let ttl = state.config.session_ttl_secs;
    let now = chrono::Utc::now().timestamp();
    let session = issue_session(&user_id, &state.config.session_secret, now, ttl)
        .ok_or_else(|| AppError::Configuration("unable to sign session".to_string()))?;

    tracing::info!(user_id = %user_id, "Console login");

    Ok((
        [(header::SET_COOKIE, session_cookie_header(&session, ttl))],
        Json(json!({ "ok": true })),
    ))
}
