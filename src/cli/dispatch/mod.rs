//! Command-line argument dispatch.
//!
//! Turns validated CLI matches into an [`Action`] carrying everything the
//! server needs to start.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::session;
use anyhow::{Context, Result, bail};
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let parsed = Url::parse(&dsn).context("invalid SAMPLE_APP_DSN")?;
    if !matches!(parsed.scheme(), "postgres" | "postgresql") {
        bail!(
            "unsupported database scheme '{}': expected postgres",
            parsed.scheme()
        );
    }

    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        session_ttl_seconds: session_opts.ttl_seconds,
        secure_cookies: session_opts.secure_cookies,
    }))
}
