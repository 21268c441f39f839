//! User lookups.

use anyhow::{Context, Result, anyhow};
use sqlx::{Connection, PgPool, Row, postgres::PgRow};
use std::{collections::HashMap, future::Future, pin::Pin};
use tokio::sync::RwLock;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::credential::{normalize_email, valid_email};
use super::digest::PasswordDigest;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_digest: PasswordDigest,
}

impl UserRecord {
    /// Canonical detail view for this user.
    #[must_use]
    pub fn profile_path(&self) -> String {
        format!("/users/{}", self.id)
    }
}

/// Read access to user accounts.
///
/// Emails passed to `find_by_email` are already normalized; implementations
/// compare them exactly.
pub trait UserDirectory: Send + Sync {
    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<UserRecord>>>;

    fn find_by_id(&self, id: Uuid) -> BoxFuture<'_, Result<Option<UserRecord>>>;

    /// Liveness check for the health endpoint.
    fn ping(&self) -> BoxFuture<'_, Result<()>>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user and return its id. The email is normalized before storing.
    ///
    /// # Errors
    /// Returns an error if the email is malformed or already taken.
    pub async fn insert(
        &self,
        name: impl Into<String>,
        email: &str,
        password_digest: PasswordDigest,
    ) -> Result<Uuid> {
        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(anyhow!("invalid email: {email}"));
        }

        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == email) {
            return Err(anyhow!("email already taken: {email}"));
        }

        let id = Uuid::new_v4();
        users.insert(
            id,
            UserRecord {
                id,
                name: name.into(),
                email,
                password_digest,
            },
        );
        Ok(id)
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<UserRecord>>> {
        Box::pin(async move {
            let users = self.users.read().await;
            Ok(users.values().find(|user| user.email == email).cloned())
        })
    }

    fn find_by_id(&self, id: Uuid) -> BoxFuture<'_, Result<Option<UserRecord>>> {
        Box::pin(async move { Ok(self.users.read().await.get(&id).cloned()) })
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Directory backed by the `users` table.
#[derive(Clone, Debug)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, query: &'static str, bind: Bind<'_>) -> Result<Option<UserRecord>> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let query = sqlx::query(query);
        let query = match bind {
            Bind::Email(email) => query.bind(email),
            Bind::Id(id) => query.bind(id),
        };
        let row = query
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user")?;

        Ok(row.as_ref().map(user_from_row))
    }
}

enum Bind<'a> {
    Email(&'a str),
    Id(Uuid),
}

fn user_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_digest: PasswordDigest::from_phc(row.get::<String, _>("password_digest")),
    }
}

impl UserDirectory for PgUserDirectory {
    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<UserRecord>>> {
        Box::pin(self.fetch_one_by(
            "SELECT id, name, email, password_digest FROM users WHERE email = $1",
            Bind::Email(email),
        ))
    }

    fn find_by_id(&self, id: Uuid) -> BoxFuture<'_, Result<Option<UserRecord>>> {
        Box::pin(self.fetch_one_by(
            "SELECT id, name, email, password_digest FROM users WHERE id = $1",
            Bind::Id(id),
        ))
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let acquire_span = info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            );
            let mut conn = self
                .pool
                .acquire()
                .instrument(acquire_span)
                .await
                .context("failed to acquire database connection")?;

            let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
            conn.ping()
                .instrument(ping_span)
                .await
                .context("failed to ping database")
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn digest() -> PasswordDigest {
        PasswordDigest::from_phc("$argon2id$v=19$m=64,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2g")
    }

    #[tokio::test]
    async fn insert_normalizes_email() -> Result<()> {
        let directory = InMemoryUserDirectory::new();
        let id = directory
            .insert("Example User", " User@Example.COM ", digest())
            .await?;

        let user = directory.find_by_email("user@example.com").await?;
        assert_eq!(user.map(|user| user.id), Some(id));
        Ok(())
    }

    #[tokio::test]
    async fn find_by_email_is_exact() -> Result<()> {
        let directory = InMemoryUserDirectory::new();
        directory
            .insert("Example User", "user@example.com", digest())
            .await?;

        assert!(directory.find_by_email("USER@example.com").await?.is_none());
        assert!(directory.find_by_email("other@example.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn insert_rejects_duplicates_and_malformed_emails() -> Result<()> {
        let directory = InMemoryUserDirectory::new();
        directory.insert("One", "one@example.com", digest()).await?;

        assert!(directory.insert("Two", "ONE@example.com", digest()).await.is_err());
        assert!(directory.insert("Three", "not-an-email", digest()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_and_profile_path() -> Result<()> {
        let directory = InMemoryUserDirectory::new();
        let id = directory.insert("One", "one@example.com", digest()).await?;

        let user = directory.find_by_id(id).await?.unwrap();
        assert_eq!(user.name, "One");
        assert_eq!(user.profile_path(), format!("/users/{id}"));
        assert!(directory.find_by_id(Uuid::new_v4()).await?.is_none());
        directory.ping().await?;
        Ok(())
    }
}
