use crate::{
    api::{self, SessionConfig},
    auth::{PgSessionStore, PgUserDirectory, SessionAuthenticator},
    cli::telemetry,
};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_ttl_seconds: i64,
    pub secure_cookies: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&args.dsn)
        .await
        .context("Failed to connect to database")?;

    let directory = Arc::new(PgUserDirectory::new(pool.clone()));
    let store = Arc::new(PgSessionStore::new(pool, args.session_ttl_seconds));
    let authenticator = Arc::new(SessionAuthenticator::new(directory, store));

    let config = SessionConfig::new()
        .with_ttl_seconds(args.session_ttl_seconds)
        .with_secure_cookies(args.secure_cookies);

    let result = api::new(args.port, authenticator, config, shutdown_signal()).await;

    telemetry::shutdown_tracer();

    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received ctrl-c"),
        () = terminate => info!("Received SIGTERM"),
    }
}
