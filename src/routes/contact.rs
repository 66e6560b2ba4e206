use axum::{body::Body, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

use crate::body::read_json_body;
use crate::constants::MAX_CONTACT_BODY_BYTES;
use crate::error::{AppError, Result};
use crate::models::ContactSubmission;
use crate::routes::validation::ensure_strict_same_origin;
use crate::AppState;

/// Contact form intake
///
/// Only same-origin browser posts are accepted. Delivery to an outbound
/// webhook is not done here; the validated submission is logged without the
/// full address or message.
pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<Value>> {
    ensure_strict_same_origin(&headers, &state.config.allowed_origins)?;

    let payload = read_json_body(&headers, body, MAX_CONTACT_BODY_BYTES).await?;
    let submission = ContactSubmission::from_json(&payload)
        .map_err(|msg| AppError::InvalidInput(msg.to_string()))?;

    tracing::info!(
        email_domain = submission.email_domain(),
        has_company = !submission.company.is_empty(),
        message_chars = submission.message.chars().count(),
        "Contact submission received"
    );

    Ok(Json(json!({ "ok": true })))
}
