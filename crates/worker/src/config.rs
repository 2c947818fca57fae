use std::str::FromStr;
use std::time::Duration;

use carecall_alerts::SchedulerConfig;
use carecall_core::error::CoreError;
use carecall_core::requests::{MAX_ESCALATION_TIMEOUT_MINUTES, MIN_ESCALATION_TIMEOUT_MINUTES};
use carecall_db::DEFAULT_MAX_CONNECTIONS;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub scheduler: SchedulerConfig,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `DATABASE_URL`               | required                |
    /// | `DB_MAX_CONNECTIONS`         | `20`                    |
    /// | `ESCALATION_INTERVAL_SECS`   | `30`                    |
    /// | `ESCALATION_TIMEOUT_MINUTES` | unset (per-alert value) |
    /// | `ESCALATION_CONCURRENCY`     | `8`                     |
    /// | `LOG_FORMAT`                 | `pretty`                |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CoreError::Validation("DATABASE_URL must be set".into()))?;

        let db_max_connections: u32 =
            parse_var(&lookup, "DB_MAX_CONNECTIONS")?.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if db_max_connections == 0 {
            return Err(CoreError::Validation(
                "DB_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }

        let defaults = SchedulerConfig::default();

        let interval = match parse_var::<u64>(&lookup, "ESCALATION_INTERVAL_SECS")? {
            Some(0) => {
                return Err(CoreError::Validation(
                    "ESCALATION_INTERVAL_SECS must be at least 1".into(),
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.interval,
        };

        let timeout_minutes: Option<i32> = parse_var(&lookup, "ESCALATION_TIMEOUT_MINUTES")?;
        if let Some(minutes) = timeout_minutes {
            if !(MIN_ESCALATION_TIMEOUT_MINUTES..=MAX_ESCALATION_TIMEOUT_MINUTES).contains(&minutes) {
                return Err(CoreError::Validation(format!(
                    "ESCALATION_TIMEOUT_MINUTES must be between \
                     {MIN_ESCALATION_TIMEOUT_MINUTES} and {MAX_ESCALATION_TIMEOUT_MINUTES}"
                )));
            }
        }

        let concurrency = match parse_var::<usize>(&lookup, "ESCALATION_CONCURRENCY")? {
            Some(0) => {
                return Err(CoreError::Validation(
                    "ESCALATION_CONCURRENCY must be at least 1".into(),
                ))
            }
            Some(n) => n,
            None => defaults.concurrency,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "LOG_FORMAT must be 'pretty' or 'json', got '{other}'"
                )))
            }
        };

        Ok(Self {
            database_url,
            db_max_connections,
            scheduler: SchedulerConfig {
                interval,
                timeout_minutes,
                concurrency,
            },
            log_format,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, CoreError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CoreError::Validation(format!("{name} has an invalid value '{raw}'"))),
    }
}
