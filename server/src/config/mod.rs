use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/raffle";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_TICKET_VALIDITY_DAYS: i64 = 7;
pub const DEFAULT_RESOLUTION_WINDOW_HOURS: i64 = 1;
pub const MAX_TICKET_VALIDITY_DAYS: i64 = 3_650;
pub const MAX_RESOLUTION_WINDOW_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Rules the lucky draw core runs with. Passed to each component at
/// construction.
#[derive(Debug, Clone)]
pub struct LuckyDrawSettings {
    pub ticket_validity: Duration,
    pub resolution_window: Duration,
    pub admins: Vec<String>,
}

impl LuckyDrawSettings {
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim();
        self.admins
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
    }
}

impl Default for LuckyDrawSettings {
    fn default() -> Self {
        Self {
            ticket_validity: Duration::days(DEFAULT_TICKET_VALIDITY_DAYS),
            resolution_window: Duration::hours(DEFAULT_RESOLUTION_WINDOW_HOURS),
            admins: Vec::new(),
        }
    }
}

pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub sweep_interval: Option<StdDuration>,
    pub cors_allowed_origins: Option<String>,
    /// `RUST_ENV=production`; enables HSTS.
    pub production: bool,
    pub lucky_draw: LuckyDrawSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let validity_days: i64 = parse_or(&lookup, "TICKET_VALIDITY_DAYS", DEFAULT_TICKET_VALIDITY_DAYS)?;
        let window_hours: i64 =
            parse_or(&lookup, "RESOLUTION_WINDOW_HOURS", DEFAULT_RESOLUTION_WINDOW_HOURS)?;
        let sweep_secs: Option<u64> = parse_optional(&lookup, "SWEEP_INTERVAL_SECS")?;

        if !(1..=MAX_TICKET_VALIDITY_DAYS).contains(&validity_days) {
            return Err(invalid("TICKET_VALIDITY_DAYS", validity_days));
        }
        if !(1..=MAX_RESOLUTION_WINDOW_HOURS).contains(&window_hours) {
            return Err(invalid("RESOLUTION_WINDOW_HOURS", window_hours));
        }
        if sweep_secs == Some(0) {
            return Err(invalid("SWEEP_INTERVAL_SECS", 0));
        }

        let admins = lookup("ADMIN_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3001)))?,
            sweep_interval: sweep_secs.map(StdDuration::from_secs),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS"),
            production: lookup("RUST_ENV")
                .is_some_and(|env| env.trim().eq_ignore_ascii_case("production")),
            lucky_draw: LuckyDrawSettings {
                ticket_validity: Duration::days(validity_days),
                resolution_window: Duration::hours(window_hours),
                admins,
            },
        })
    }
}

fn invalid(name: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

fn parse_optional<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(name, raw)),
        _ => Ok(None),
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    Ok(parse_optional(lookup, name)?.unwrap_or(default))
}
