use serde_json::Value;

use crate::constants::{
    ERR_CONTACT_EMAIL, ERR_CONTACT_FIELDS_TOO_LONG, ERR_CONTACT_MESSAGE_TOO_LONG,
    ERR_CONTACT_MESSAGE_TOO_SHORT, ERR_CONTACT_NAME, MAX_CONTACT_COMPANY_CHARS,
    MAX_CONTACT_MESSAGE_CHARS, MAX_CONTACT_NAME_CHARS, MAX_EMAIL_LENGTH_CHARS,
    MIN_CONTACT_MESSAGE_CHARS, MIN_CONTACT_NAME_CHARS,
};
use crate::models::account::{canonical_email, is_valid_email};

/// A validated contact form submission, trimmed and with the email
/// canonicalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub company: String,
    pub message: String,
}

fn string_field<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.get(name).and_then(|v| v.as_str())
}

impl ContactSubmission {
    /// Validate a posted form. Checks run in a fixed order and the first
    /// failure's client-facing message is returned.
    pub fn from_json(value: &Value) -> Result<Self, &'static str> {
        let name = string_field(value, "name")
            .filter(|n| n.trim().chars().count() >= MIN_CONTACT_NAME_CHARS)
            .ok_or(ERR_CONTACT_NAME)?;

        let email = string_field(value, "email")
            .filter(|e| is_valid_email(e))
            .ok_or(ERR_CONTACT_EMAIL)?;

        let message = string_field(value, "message")
            .filter(|m| m.trim().chars().count() >= MIN_CONTACT_MESSAGE_CHARS)
            .ok_or(ERR_CONTACT_MESSAGE_TOO_SHORT)?;

        let company = string_field(value, "company").unwrap_or_default();

        if name.chars().count() > MAX_CONTACT_NAME_CHARS
            || email.chars().count() > MAX_EMAIL_LENGTH_CHARS
            || company.chars().count() > MAX_CONTACT_COMPANY_CHARS
        {
            return Err(ERR_CONTACT_FIELDS_TOO_LONG);
        }
        if message.chars().count() > MAX_CONTACT_MESSAGE_CHARS {
            return Err(ERR_CONTACT_MESSAGE_TOO_LONG);
        }

        Ok(ContactSubmission {
            name: name.trim().to_string(),
            email: canonical_email(email).ok_or(ERR_CONTACT_EMAIL)?,
            company: company.trim().to_string(),
            message: message.trim().to_string(),
        })
    }

    /// Domain part of the email, for logging without the full address
    pub fn email_domain(&self) -> &str {
        self.email.rsplit_once('@').map(|(_, d)| d).unwrap_or("unknown")
    }
}
