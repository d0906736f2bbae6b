//! Top-level server configuration.

use std::collections::HashMap;
use std::env::VarError;
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::parse;
use crate::sub::{AuthConfig, DbConfig};

/// Immutable snapshot of the settings the service boots with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub title: String,
    pub host: String,
    pub port: u16,
    pub workers: NonZeroUsize,
    pub debug: bool,
    /// Upper bound for the drain phase and for each shutdown action.
    pub shutdown_timeout: Duration,
    pub db: DbConfig,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub const TITLE: &'static str = "Billing Service API";
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;
    pub const DEFAULT_WORKERS: NonZeroUsize = NonZeroUsize::MIN;
    pub const DEFAULT_DEBUG: bool = true;
    pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

    /// Every environment variable the loader reads.
    pub const ENV_KEYS: [&'static str; 9] = [
        "APP_HOST",
        "APP_PORT",
        "WORKERS",
        "DEBUG",
        "SHUTDOWN_TIMEOUT_SECS",
        "DATABASE_URL",
        "REDIS_URL",
        "JWT_SECRET",
        "JWT_ALGORITHM",
    ];

    /// Load from the process environment.
    ///
    /// A variable holding non-UTF-8 bytes is rejected, not treated as unset.
    pub fn from_env() -> ConfigResult<Self> {
        let mut env = HashMap::new();
        for key in Self::ENV_KEYS {
            if let Some(value) = env_value(key, std::env::var(key))? {
                env.insert(key, value);
            }
        }
        let config = Self::from_lookup(|key| env.get(key).cloned())?;
        tracing::debug!(
            host = %config.host,
            port = config.port,
            workers = config.workers.get(),
            debug = config.debug,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load from an arbitrary key lookup.
    ///
    /// Missing keys take their defaults; present keys must coerce cleanly.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let host = match lookup("APP_HOST") {
            Some(raw) => parse::non_empty("APP_HOST", &raw)?,
            None => Self::DEFAULT_HOST.to_string(),
        };
        let port = match lookup("APP_PORT") {
            Some(raw) => parse::port("APP_PORT", &raw)?,
            None => Self::DEFAULT_PORT,
        };
        let workers = match lookup("WORKERS") {
            Some(raw) => parse::positive("WORKERS", &raw)?,
            None => Self::DEFAULT_WORKERS,
        };
        let debug = match lookup("DEBUG") {
            Some(raw) => parse::flag("DEBUG", &raw)?,
            None => Self::DEFAULT_DEBUG,
        };
        let shutdown_secs = match lookup("SHUTDOWN_TIMEOUT_SECS") {
            Some(raw) => parse::positive("SHUTDOWN_TIMEOUT_SECS", &raw)?.get() as u64,
            None => Self::DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        };

        Ok(Self {
            title: Self::TITLE.to_string(),
            host,
            port,
            workers,
            debug,
            shutdown_timeout: Duration::from_secs(shutdown_secs),
            db: DbConfig::from_lookup(&lookup),
            auth: AuthConfig::from_lookup(&lookup),
        })
    }

    /// `host:port` string handed to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_value(key: &'static str, read: Result<String, VarError>) -> ConfigResult<Option<String>> {
    match read {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(ConfigError::invalid(
            key,
            raw.to_string_lossy(),
            "not valid UTF-8",
        )),
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            title: Self::TITLE.to_string(),
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            workers: Self::DEFAULT_WORKERS,
            debug: Self::DEFAULT_DEBUG,
            shutdown_timeout: Duration::from_secs(Self::DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            db: DbConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}
