//! Login input and email normalization.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Email and password submitted with the login form.
pub struct Credential {
    email: String,
    password: SecretString,
}

impl Credential {
    #[must_use]
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    /// Email exactly as submitted.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Email in the form used for directory lookups.
    #[must_use]
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email(""), "");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email(""));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn credential_debug_redacts_password() {
        let credential = Credential::new("User@Example.com", SecretString::from("secret"));
        let debug = format!("{credential:?}");
        assert!(debug.contains("User@Example.com"));
        assert!(!debug.contains("secret"));
        assert_eq!(credential.normalized_email(), "user@example.com");
        assert_eq!(credential.password(), "secret");
    }
}
