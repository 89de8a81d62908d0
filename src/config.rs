use std::str::FromStr;
use std::time::Duration;

use crate::security::oauth2::GoogleSettings;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REDIRECT_URL must be set together")]
    PartialGoogle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Debug,
    Production,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub host: String,
    pub port: u16,
    /// `None` keeps users in memory; not allowed in production.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub request_timeout: Duration,
    pub bcrypt_cost: u32,
    pub google: Option<GoogleSettings>,
}

impl Settings {
    /// Reads settings from the process environment (after `.env`, if any, was
    /// loaded by the caller).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mode = match var("MODE").as_deref() {
            Some("prod") => Mode::Production,
            _ => Mode::Debug,
        };

        let database_url = var("DATABASE_URL");
        if mode == Mode::Production && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let google = match (
            var("GOOGLE_CLIENT_ID"),
            var("GOOGLE_CLIENT_SECRET"),
            var("GOOGLE_REDIRECT_URL"),
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_url)) => Some(GoogleSettings {
                client_id,
                client_secret,
                redirect_url,
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::PartialGoogle),
        };

        Ok(Self {
            mode,
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&var, "PORT", 8080)?,
            database_url,
            jwt_secret: var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            token_ttl: token_ttl(&var)?,
            request_timeout: Duration::from_secs(parse_or(&var, "REQUEST_TIMEOUT_SECS", 10)?),
            bcrypt_cost: bcrypt_cost(&var)?,
            google,
        })
    }
}

fn token_ttl(var: &impl Fn(&str) -> Option<String>) -> Result<Duration, ConfigError> {
    let days: u64 = parse_or(var, "TOKEN_TTL_DAYS", 90)?;
    let secs = days
        .checked_mul(SECONDS_PER_DAY)
        .ok_or_else(|| ConfigError::Invalid {
            name: "TOKEN_TTL_DAYS",
            value: days.to_string(),
        })?;
    Ok(Duration::from_secs(secs))
}

/// bcrypt only accepts costs in `4..=31`.
fn bcrypt_cost(var: &impl Fn(&str) -> Option<String>) -> Result<u32, ConfigError> {
    let cost = parse_or(var, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
    if !(4..=31).contains(&cost) {
        return Err(ConfigError::Invalid {
            name: "BCRYPT_COST",
            value: cost.to_string(),
        });
    }
    Ok(cost)
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
