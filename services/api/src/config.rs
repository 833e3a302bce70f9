//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::NaiveTime;
use std::net::SocketAddr;
use std::str::FromStr;
use study_planner_core::scheduler::MAX_WINDOW_DAYS;
use study_planner_core::SchedulingPreferences;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When unset, topics and plans live in process memory only.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub cors_origin: String,
    /// Defaults applied to any preference a plan request leaves out.
    pub scheduling: SchedulingPreferences,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Storage Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Scheduling Defaults ---
        let defaults = SchedulingPreferences::default();
        let start_time = match lookup("DEFAULT_START_TIME") {
            Some(raw) => parse_time_of_day(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DEFAULT_START_TIME".to_string(),
                    format!("'{}' is not a HH:MM time", raw),
                )
            })?,
            None => defaults.start_time,
        };
        let scheduling = SchedulingPreferences {
            daily_hours: parse_var(&lookup, "DEFAULT_DAILY_HOURS", defaults.daily_hours)?,
            start_time,
            break_minutes: parse_var(&lookup, "DEFAULT_BREAK_MINUTES", defaults.break_minutes)?,
            window_days: parse_var(&lookup, "SCHEDULE_WINDOW_DAYS", defaults.window_days)?,
            session_cap_hours: parse_var(&lookup, "SESSION_CAP_HOURS", defaults.session_cap_hours)?,
        };
        for (key, hours) in [
            ("DEFAULT_DAILY_HOURS", scheduling.daily_hours),
            ("SESSION_CAP_HOURS", scheduling.session_cap_hours),
        ] {
            if !(hours.is_finite() && hours > 0.0) {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    format!("'{}' is not a positive number of hours", hours),
                ));
            }
        }
        if scheduling.window_days == 0 || scheduling.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::InvalidValue(
                "SCHEDULE_WINDOW_DAYS".to_string(),
                format!("must be between 1 and {}", MAX_WINDOW_DAYS),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            scheduling,
        })
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("'{}' could not be parsed", raw))
        }),
        None => Ok(default),
    }
}
