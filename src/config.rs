use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};

use crate::crypto::secret::SessionSecret;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// Whether the process runs with `APP_ENV=production`.
    pub production: bool,
    /// The URL of the PostgreSQL database. Unset means the in-memory store.
    pub database_url: Option<String>,
    /// The key that signs session tokens.
    pub session_secret: SessionSecret,
    /// The invite token required to sign up.
    pub invite_token: Option<String>,
    /// The public origin of the app, used in invite links.
    pub app_url: String,
    /// The address the server listens on.
    pub bind_addr: SocketAddr,
    /// The directory served for non-API paths.
    pub static_dir: String,
    /// The lifetime of the session cookie in days.
    pub session_max_age_days: i64,
}

/// The longest accepted session cookie lifetime, in days.
pub const MAX_SESSION_AGE_DAYS: i64 = 3650;

/// Parses `SESSION_MAX_AGE_DAYS`, which must lie in `1..=MAX_SESSION_AGE_DAYS`.
fn parse_session_max_age_days(raw: &str) -> Result<i64> {
    let days: i64 = raw
        .trim()
        .parse()
        .context("SESSION_MAX_AGE_DAYS must be a whole number of days")?;

    if !(1..=MAX_SESSION_AGE_DAYS).contains(&days) {
        anyhow::bail!(
            "SESSION_MAX_AGE_DAYS must be between 1 and {} (got {})",
            MAX_SESSION_AGE_DAYS,
            days
        );
    }

    Ok(days)
}

/// Reads a variable, treating an empty value as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`. Fails in production when
    /// `SESSION_SECRET` or `DATABASE_URL` is missing.
    pub fn from_env() -> Result<Self> {
        let production = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string()) == "production";

        let session_secret = SessionSecret::resolve(env::var("SESSION_SECRET").ok(), production)
            .context("SESSION_SECRET must be set when APP_ENV=production (generate with: openssl rand -hex 32)")?;

        let database_url = optional_var("DATABASE_URL");
        if production && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when APP_ENV=production");
        }

        Ok(Self {
            production,
            database_url,
            session_secret,
            invite_token: optional_var("INVITE_TOKEN"),
            app_url: env::var("APP_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "public".to_string()),
            session_max_age_days: parse_session_max_age_days(
                &env::var("SESSION_MAX_AGE_DAYS").unwrap_or_else(|_| "30".to_string()),
            )?,
        })
    }

    /// A development configuration with an explicit secret.
    pub fn development(session_secret: SessionSecret) -> Self {
        Self {
            production: false,
            database_url: None,
            session_secret,
            invite_token: None,
            app_url: "http://localhost:3000".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            static_dir: "public".to_string(),
            session_max_age_days: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_max_age_accepts_the_documented_range() {
        assert_eq!(parse_session_max_age_days("30").unwrap(), 30);
        assert_eq!(parse_session_max_age_days(" 1 ").unwrap(), 1);
        assert_eq!(
            parse_session_max_age_days("3650").unwrap(),
            MAX_SESSION_AGE_DAYS
        );
    }

    #[test]
    fn session_max_age_rejects_out_of_range_values() {
        for raw in ["0", "-1", "3651", "9223372036854775", "thirty", ""] {
            let err = parse_session_max_age_days(raw).unwrap_err();
            assert!(
                format!("{:#}", err).contains("SESSION_MAX_AGE_DAYS"),
                "{raw}: {err:#}"
            );
        }
    }
}
