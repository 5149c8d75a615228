//! Credential input parsing and email normalization

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

const MAX_EMAIL_LENGTH: usize = 254;

#[allow(clippy::expect_used)] // literal pattern
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

pub const MISSING_CREDENTIALS_MESSAGE: &str = "Email and password are required";
pub const INVALID_EMAIL_MESSAGE: &str = "Please provide a valid email address";

/// Email/password pair that passed shape validation.
///
/// `email` is normalized; `password` is kept exactly as submitted.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Parse a raw `{email, password}` JSON body.
///
/// Both fields must be strings that are non-empty after trimming. The error
/// string is safe to return to the client.
pub fn parse_credentials(body: &[u8]) -> Result<Credentials, String> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| MISSING_CREDENTIALS_MESSAGE.to_string())?;

    let (Some(email), Some(password)) = (
        value.get("email").and_then(Value::as_str),
        value.get("password").and_then(Value::as_str),
    ) else {
        return Err(MISSING_CREDENTIALS_MESSAGE.to_string());
    };

    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(MISSING_CREDENTIALS_MESSAGE.to_string());
    }

    let email = normalize_email(email).ok_or_else(|| INVALID_EMAIL_MESSAGE.to_string())?;

    Ok(Credentials {
        email,
        password: password.to_string(),
    })
}

/// Trim + lowercase, then require an address-shaped result
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LENGTH || !EMAIL_PATTERN.is_match(&email) {
        return None;
    }
    Some(email)
}
