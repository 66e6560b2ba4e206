use axum::http::{header, HeaderMap};

use crate::error::AppError;

/// Browser requests must come from one of the configured origins. Requests
/// without an `Origin` header (server-to-server, same-origin GET) pass.
pub fn ensure_same_origin(headers: &HeaderMap, allowed_origins: &[String]) -> Result<(), AppError> {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return Ok(());
    };

    let allowed = origin
        .to_str()
        .map(|origin| allowed_origins.iter().any(|allowed| allowed == origin))
        .unwrap_or(false);

    if !allowed {
        tracing::warn!(origin = ?origin, "Cross-origin request rejected");
        return Err(AppError::OriginNotAllowed);
    }
    Ok(())
}

/// Like [`ensure_same_origin`], but a missing `Origin` header is also
/// rejected. Used where only browser form posts are expected.
pub fn ensure_strict_same_origin(
    headers: &HeaderMap,
    allowed_origins: &[String],
) -> Result<(), AppError> {
    if !headers.contains_key(header::ORIGIN) {
        tracing::warn!("Request without Origin header rejected");
        return Err(AppError::OriginNotAllowed);
    }
    ensure_same_origin(headers, allowed_origins)
}

/// Package names as accepted by the registry: 1..=214 characters of
/// `[A-Za-z0-9._-]`, not starting with a dot.
pub fn is_valid_package_name(name: &str) -> bool {
    (1..=214).contains(&name.len())
        && !name.starts_with('.')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}
