//! Session bindings.
//!
//! A session token is 32 random bytes, base64url encoded. Raw tokens only travel
//! in the session cookie; stores key their bindings by the SHA-256 hash.

use anyhow::{Context, Result, anyhow};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::directory::BoxFuture;

const SESSION_TOKEN_BYTES: usize = 32;

const PRUNE_EXPIRED_SESSIONS: &str = "DELETE FROM user_sessions WHERE expires_at <= NOW()";

#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Create a new random token.
    ///
    /// # Errors
    /// Returns an error if the OS random source fails.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SESSION_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate session token")?;
        Ok(Self(Base64UrlUnpadded::encode_string(&bytes)))
    }

    /// Accept a token presented by a client. Blank values are treated as absent.
    #[must_use]
    pub fn from_presented(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash used as the storage key, so raw values never touch the database.
    #[must_use]
    pub fn hash(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hasher.finalize().to_vec()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Server-side session bindings.
pub trait SessionStore: Send + Sync {
    /// Bind a fresh session to `user_id` and return its token.
    fn bind(&self, user_id: Uuid) -> BoxFuture<'_, Result<SessionToken>>;

    /// User bound to `token`, if the binding exists and has not expired.
    fn resolve<'a>(&'a self, token: &'a SessionToken) -> BoxFuture<'a, Result<Option<Uuid>>>;

    /// Remove the binding for `token`. Returns `false` when there was none.
    fn clear<'a>(&'a self, token: &'a SessionToken) -> BoxFuture<'a, Result<bool>>;
}

#[derive(Debug)]
struct SessionEntry {
    user_id: Uuid,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct InMemorySessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<Vec<u8>, SessionEntry>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live bindings.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .lock()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn bind(&self, user_id: Uuid) -> BoxFuture<'_, Result<SessionToken>> {
        Box::pin(async move {
            let token = SessionToken::generate()?;
            let now = Instant::now();
            let expires_at = now
                .checked_add(self.ttl)
                .context("session ttl out of range")?;
            let mut sessions = self.sessions.lock().await;
            sessions.retain(|_, entry| entry.expires_at > now);
            sessions.insert(token.hash(), SessionEntry { user_id, expires_at });
            Ok(token)
        })
    }

    fn resolve<'a>(&'a self, token: &'a SessionToken) -> BoxFuture<'a, Result<Option<Uuid>>> {
        Box::pin(async move {
            let sessions = self.sessions.lock().await;
            Ok(sessions
                .get(&token.hash())
                .filter(|entry| entry.expires_at > Instant::now())
                .map(|entry| entry.user_id))
        })
    }

    fn clear<'a>(&'a self, token: &'a SessionToken) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move { Ok(self.sessions.lock().await.remove(&token.hash()).is_some()) })
    }
}

/// Store backed by the `user_sessions` table.
#[derive(Clone, Debug)]
pub struct PgSessionStore {
    pool: PgPool,
    ttl_seconds: i64,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool, ttl_seconds: i64) -> Self {
        Self { pool, ttl_seconds }
    }

    async fn prune_expired(&self) -> Result<()> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = PRUNE_EXPIRED_SESSIONS
        );
        sqlx::query(PRUNE_EXPIRED_SESSIONS)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to prune expired sessions")?;
        Ok(())
    }

    async fn insert(&self, user_id: Uuid) -> Result<SessionToken> {
        self.prune_expired().await?;

        let query = r"
            INSERT INTO user_sessions (session_hash, user_id, expires_at)
            VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        for _ in 0..3 {
            let token = SessionToken::generate()?;
            let result = sqlx::query(query)
                .bind(token.hash())
                .bind(user_id)
                .bind(self.ttl_seconds)
                .execute(&self.pool)
                .instrument(span.clone())
                .await;

            match result {
                Ok(_) => return Ok(token),
                Err(err) if is_unique_violation(&err) => {}
                Err(err) => return Err(err).context("failed to insert session"),
            }
        }

        Err(anyhow!("failed to generate unique session token"))
    }

    async fn lookup(&self, token: &SessionToken) -> Result<Option<Uuid>> {
        let query = r"
            SELECT user_id
            FROM user_sessions
            WHERE session_hash = $1
              AND expires_at > NOW()
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(token.hash())
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup session")?;

        Ok(row.map(|row| row.get("user_id")))
    }

    async fn delete(&self, token: &SessionToken) -> Result<bool> {
        // Logout is idempotent; it's fine if no rows are deleted.
        let query = "DELETE FROM user_sessions WHERE session_hash = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(token.hash())
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete session")?;

        Ok(result.rows_affected() > 0)
    }
}

impl SessionStore for PgSessionStore {
    fn bind(&self, user_id: Uuid) -> BoxFuture<'_, Result<SessionToken>> {
        Box::pin(self.insert(user_id))
    }

    fn resolve<'a>(&'a self, token: &'a SessionToken) -> BoxFuture<'a, Result<Option<Uuid>>> {
        Box::pin(self.lookup(token))
    }

    fn clear<'a>(&'a self, token: &'a SessionToken) -> BoxFuture<'a, Result<bool>> {
        Box::pin(self.delete(token))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn generate_token_is_32_bytes_url_safe() -> Result<()> {
        let token = SessionToken::generate()?;
        let decoded = Base64UrlUnpadded::decode_vec(token.as_str())
            .map_err(|err| anyhow!("decode session token: {err}"))?;
        assert_eq!(decoded.len(), SESSION_TOKEN_BYTES);
        assert_ne!(SessionToken::generate()?, token);
        Ok(())
    }

    #[test]
    fn hash_is_stable() {
        let token = SessionToken::from_presented("token").unwrap();
        let other = SessionToken::from_presented("other").unwrap();
        assert_eq!(token.hash(), token.clone().hash());
        assert_ne!(token.hash(), other.hash());
        assert_eq!(token.hash().len(), 32);
    }

    #[test]
    fn from_presented_rejects_blank() {
        assert!(SessionToken::from_presented("").is_none());
        assert!(SessionToken::from_presented("   ").is_none());
        assert_eq!(
            SessionToken::from_presented(" abc ").map(|t| t.as_str().to_string()),
            Some("abc".to_string())
        );
    }

    #[test]
    fn debug_hides_token() {
        let token = SessionToken::from_presented("raw-value").unwrap();
        assert!(!format!("{token:?}").contains("raw-value"));
    }

    #[tokio::test]
    async fn bind_resolve_clear() -> Result<()> {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let user_id = Uuid::new_v4();

        let token = store.bind(user_id).await?;
        assert_eq!(store.resolve(&token).await?, Some(user_id));
        assert_eq!(store.len().await, 1);

        assert!(store.clear(&token).await?);
        assert_eq!(store.resolve(&token).await?, None);
        assert!(!store.clear(&token).await?);
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() -> Result<()> {
        let store = InMemorySessionStore::new(Duration::ZERO);
        let token = store.bind(Uuid::new_v4()).await?;
        assert_eq!(store.resolve(&token).await?, None);
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_resolves_to_none() -> Result<()> {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let token = SessionToken::generate()?;
        assert_eq!(store.resolve(&token).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn oversized_ttl_is_an_error() -> Result<()> {
        let store = InMemorySessionStore::new(Duration::MAX);
        assert!(store.bind(Uuid::new_v4()).await.is_err());
        assert!(store.is_empty().await);
        Ok(())
    }

    #[test]
    fn prune_targets_expired_rows_only() {
        assert!(PRUNE_EXPIRED_SESSIONS.starts_with("DELETE FROM user_sessions"));
        assert!(PRUNE_EXPIRED_SESSIONS.ends_with("WHERE expires_at <= NOW()"));
    }
}
