//! Stored password verifier.
//!
//! Digests are Argon2id PHC strings. The authenticator only ever asks a digest
//! whether a plaintext password matches; the hash itself is never exposed.

use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use std::fmt;

/// Well-formed digest that matches no password. Verifying against it costs the
/// same as verifying against a real digest with default parameters.
const PLACEHOLDER_DIGEST: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hash a password with the default Argon2id parameters.
    ///
    /// # Errors
    /// Returns an error if hashing fails.
    pub fn hash(password: &str) -> Result<Self> {
        hash_with(&Argon2::default(), password)
    }

    /// Hash a password with explicit cost parameters.
    ///
    /// # Errors
    /// Returns an error if the parameters are out of range or hashing fails.
    pub fn hash_with_cost(password: &str, memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|err| anyhow!("invalid Argon2 parameters: {err}"))?;
        hash_with(
            &Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            password,
        )
    }

    /// Wrap a stored PHC string.
    #[must_use]
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub(crate) fn placeholder() -> Self {
        Self(PLACEHOLDER_DIGEST.to_string())
    }

    #[must_use]
    pub fn as_phc(&self) -> &str {
        &self.0
    }

    /// Check a plaintext password. Unparseable digests never match.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.0) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(***)")
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<PasswordDigest> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| anyhow!("failed to hash password"))?
        .to_string();
    Ok(PasswordDigest(hash))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_password() {
        let digest = PasswordDigest::hash_with_cost("secret", 64, 1).unwrap();
        assert!(digest.as_phc().starts_with("$argon2id$"));
        assert!(digest.verify("secret"));
        assert!(!digest.verify("wrong"));
        assert!(!digest.verify(""));
    }

    #[test]
    fn verify_rejects_garbage_digest() {
        assert!(!PasswordDigest::from_phc("not-a-phc-string").verify("secret"));
        assert!(!PasswordDigest::from_phc("").verify(""));
    }

    #[test]
    fn placeholder_parses_and_matches_nothing() {
        assert!(PasswordHash::new(PLACEHOLDER_DIGEST).is_ok());
        assert!(!PasswordDigest::placeholder().verify("secret"));
    }

    #[test]
    fn hash_with_cost_rejects_invalid_parameters() {
        assert!(PasswordDigest::hash_with_cost("secret", 64, 0).is_err());
    }

    #[test]
    fn debug_hides_hash() {
        let digest = PasswordDigest::from_phc("$argon2id$secret-material");
        assert_eq!(format!("{digest:?}"), "PasswordDigest(***)");
    }
}
