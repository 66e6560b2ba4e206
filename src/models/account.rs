use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::constants::{
    ERR_CREDENTIALS_TOO_LONG, ERR_INVALID_EMAIL, ERR_PASSWORD_TOO_SHORT, MAX_EMAIL_LENGTH_CHARS,
    MAX_PASSWORD_LENGTH_CHARS, MIN_PASSWORD_LENGTH_CHARS,
};
use crate::error::Result;

/// Credential storage and verification, owned by an external store
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create an account. Returns `AppError::AlreadyExists` for a taken email.
    async fn create_user(&self, email: &str, password: &str) -> Result<String>;

    /// Return the user id when the credentials match.
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<String>>;
}

/// Credentials as posted by the registration and login forms.
///
/// Fields are optional so that a missing field is a validation problem, not
/// a parse failure.
#[derive(Debug, Default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Lenient extraction from an arbitrary JSON value
    pub fn from_json(value: &serde_json::Value) -> Self {
        Credentials {
            email: value
                .get("email")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            password: value
                .get("password")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        }
    }

    pub fn normalized_email(&self) -> Option<String> {
        self.email.as_deref().and_then(canonical_email)
    }

    /// Validate for registration. Returns `(email, password)` on success or
    /// the client-facing message on failure.
    pub fn validate_for_registration(&self) -> std::result::Result<(String, &str), &'static str> {
        let email = self.normalized_email().ok_or(ERR_INVALID_EMAIL)?;
        let password = self.password.as_deref().ok_or(ERR_INVALID_EMAIL)?;

        if !is_valid_email(&email) {
            return Err(ERR_INVALID_EMAIL);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH_CHARS {
            return Err(ERR_PASSWORD_TOO_SHORT);
        }
        if email.chars().count() > MAX_EMAIL_LENGTH_CHARS
            || password.chars().count() > MAX_PASSWORD_LENGTH_CHARS
        {
            return Err(ERR_CREDENTIALS_TOO_LONG);
        }
        Ok((email, password))
    }
}

/// Trimmed, lowercased email; `None` when nothing is left. Length limits are
/// applied by each caller.
pub fn canonical_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return None;
    }
    Some(email)
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}
