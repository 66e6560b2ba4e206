//! Short-lived signed assertions for calls to the upstream control API.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    CONTROL_API_TOKEN_AUDIENCE, CONTROL_API_TOKEN_ISSUER, CONTROL_API_TOKEN_TTL_SECS,
    MIN_API_AUTH_SECRET_BYTES,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlApiClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Token issuance failures. These messages are for server logs only.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("PROVENACT_API_AUTH_SECRET is required")]
    MissingSecret,
    #[error("PROVENACT_API_AUTH_SECRET must be at least {} bytes", MIN_API_AUTH_SECRET_BYTES)]
    WeakSecret,
    #[error("user id is required to create a control API token")]
    MissingUserId,
    #[error("failed to sign control API token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Mint an HS256 token for `user_id`, valid for five minutes from now.
pub fn issue_control_api_token(secret: Option<&str>, user_id: &str) -> Result<String, TokenError> {
    issue_control_api_token_at(secret, user_id, Utc::now())
}

pub fn issue_control_api_token_at(
    secret: Option<&str>,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let secret = secret.map(str::trim).ok_or(TokenError::MissingSecret)?;
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    if secret.len() < MIN_API_AUTH_SECRET_BYTES {
        return Err(TokenError::WeakSecret);
    }
    if user_id.is_empty() {
        return Err(TokenError::MissingUserId);
    }

    let issued_at = now.timestamp();
    let claims = ControlApiClaims {
        sub: user_id.to_string(),
        iss: CONTROL_API_TOKEN_ISSUER.to_string(),
        aud: CONTROL_API_TOKEN_AUDIENCE.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: issued_at,
        nbf: issued_at,
        exp: issued_at + CONTROL_API_TOKEN_TTL_SECS,
    };

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}
