//! HMAC-signed console session cookies.
//!
//! Cookie value: `<user_id>.<expires_at_unix>.<hex hmac>` where the MAC
//! covers `<user_id>.<expires_at_unix>`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::constants::SESSION_COOKIE_NAME;
use crate::error::AppError;
use crate::security::{sign_hmac, verify_hmac};
use crate::AppState;

/// Produce a signed session value for `user_id` valid until `now + ttl_secs`.
pub fn issue_session(user_id: &str, secret: &str, now: i64, ttl_secs: i64) -> Option<String> {
    if user_id.is_empty() || user_id.contains('.') {
        return None;
    }
    let payload = format!("{}.{}", user_id, now + ttl_secs);
    let signature = sign_hmac(&payload, secret)?;
    Some(format!("{}.{}", payload, signature))
}

/// Verify a session value and return the user id it carries.
pub fn verify_session(value: &str, secret: &str, now: i64) -> Option<String> {
    let mut parts = value.rsplitn(3, '.');
    let signature = parts.next()?;
    let expires_at = parts.next()?;
    let user_id = parts.next()?;
    if user_id.is_empty() {
        return None;
    }

    let payload = format!("{}.{}", user_id, expires_at);
    if !verify_hmac(&payload, signature, secret) {
        tracing::warn!("Session cookie signature mismatch");
        return None;
    }

    let expires_at: i64 = expires_at.parse().ok()?;
    if now >= expires_at {
        return None;
    }
    Some(user_id.to_string())
}

/// `Set-Cookie` header value for a freshly issued session
pub fn session_cookie_header(value: &str, ttl_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE_NAME, value, ttl_secs
    )
}

fn session_cookie_value(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value)
}

/// Authenticated console user, resolved from the session cookie
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let value = session_cookie_value(&parts.headers).ok_or(AppError::Unauthorized)?;
        let now = chrono::Utc::now().timestamp();
        let user_id = verify_session(value, &state.config.session_secret, now)
            .ok_or(AppError::Unauthorized)?;
        Ok(SessionUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "session-secret-session-secret-32b";
    const USER: &str = "6f1c2f8e-2a57-4c0b-9d43-1f1f5b7d0a11";

    #[test]
    fn test_issue_and_verify() {
        let value = issue_session(USER, SECRET, 1_000, 60).unwrap();
        assert_eq!(verify_session(&value, SECRET, 1_030), Some(USER.to_string()));
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let value = issue_session(USER, SECRET, 1_000, 60).unwrap();
        assert_eq!(verify_session(&value, SECRET, 1_060), None);
    }

    #[test]
    fn test_tampered_session_is_rejected() {
        let value = issue_session(USER, SECRET, 1_000, 60).unwrap();
        let forged = value.replacen(USER, "00000000-0000-0000-0000-000000000000", 1);
        assert_eq!(verify_session(&forged, SECRET, 1_010), None);

        let extended = value.replacen("1060", "9999999999", 1);
        assert_eq!(verify_session(&extended, SECRET, 1_010), None);

        assert_eq!(verify_session(&value, "another-secret-another-secret-xx", 1_010), None);
        assert_eq!(verify_session("garbage", SECRET, 1_010), None);
    }

    #[test]
    fn test_rejects_user_ids_that_break_the_format() {
        assert!(issue_session("", SECRET, 0, 60).is_none());
        assert!(issue_session("a.b", SECRET, 0, 60).is_none());
    }

    #[test]
    fn test_cookie_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; provenact_session=abc.123.def; other=1"),
        );
        assert_eq!(session_cookie_value(&headers), Some("abc.123.def"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_cookie_value(&headers), None);
    }

    #[test]
    fn test_cookie_header_attributes() {
        let header = session_cookie_header("v", 60);
        assert!(header.starts_with("provenact_session=v;"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("Max-Age=60"));
    }
}
