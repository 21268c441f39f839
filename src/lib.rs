//! # Sample App (session authentication)
//!
//! `sample_app` is a small web application that logs users in with an email and
//! password and keeps them logged in with a server-side session.
//!
//! ## Sessions
//!
//! The core is [`auth::SessionAuthenticator`]. It talks to two collaborators:
//!
//! - **User directory:** looks users up by their normalized (lowercase) email.
//! - **Session store:** binds a random session token to a user id. Only the
//!   SHA-256 hash of the token is stored; the raw value lives in the
//!   `sample_app_session` cookie.
//!
//! Failed logins never disclose which factor was wrong: an unknown email and a
//! wrong password produce the same outcome, the same notice, and the same amount
//! of password hashing work.
//!
//! ## Notices
//!
//! Notices are request scoped. Handlers create a [`auth::Flash`], hand it to the
//! authenticator, and render whatever it collected into the same response.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
