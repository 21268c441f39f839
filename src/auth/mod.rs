//! Credential-based session authentication.
//!
//! [`SessionAuthenticator`] owns the login decision. Everything it needs from the
//! outside world goes through two narrow collaborators:
//!
//! - [`UserDirectory`]: find a user by normalized email (or id).
//! - [`SessionStore`]: bind, resolve and clear session tokens.
//!
//! Both ship with a Postgres implementation for the server and an in-memory one
//! for tests and embedding.

mod authenticator;
mod credential;
mod digest;
mod directory;
mod notice;
mod store;

pub use authenticator::{
    AuthFailure, AuthOutcome, INVALID_CREDENTIAL_MESSAGE, LoginForm, SessionAuthenticator,
    SessionState,
};
pub use credential::{Credential, normalize_email, valid_email};
pub use digest::PasswordDigest;
pub use directory::{BoxFuture, InMemoryUserDirectory, PgUserDirectory, UserDirectory, UserRecord};
pub use notice::{Flash, Notice, Severity};
pub use store::{InMemorySessionStore, PgSessionStore, SessionStore, SessionToken};
