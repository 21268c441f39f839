use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

/// One year.
pub const MAX_SESSION_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session lifetime in seconds, applied to the cookie and the stored session")
                .env("SAMPLE_APP_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark the session cookie Secure (serve behind TLS)")
                .env("SAMPLE_APP_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub ttl_seconds: i64,
    pub secure_cookies: bool,
}

impl Options {
    /// Read session options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if the TTL is not positive or exceeds one year.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(604_800);
        if ttl_seconds <= 0 {
            bail!("--{ARG_SESSION_TTL_SECONDS} must be greater than zero");
        }
        if ttl_seconds > MAX_SESSION_TTL_SECONDS {
            bail!("--{ARG_SESSION_TTL_SECONDS} must be at most {MAX_SESSION_TTL_SECONDS}");
        }

        Ok(Self {
            ttl_seconds,
            secure_cookies: matches.get_flag(ARG_SECURE_COOKIES),
        })
    }
}
