//! Connection-related data models.
//!
//! Database settings are read from the environment on every tool call, so an operator
//! can rotate credentials or change limits without restarting the server.

use crate::error::{DbError, DbResult};
use std::fmt;
use std::time::Duration;

pub const ENV_CONNECTION_STRING: &str = "ORACLE_CONNECTION_STRING";
pub const ENV_COMMAND_TIMEOUT_SECONDS: &str = "ORACLE_COMMAND_TIMEOUT_SECONDS";
pub const ENV_DEFAULT_MAX_ROWS: &str = "ORACLE_DEFAULT_MAX_ROWS";
pub const ENV_MAX_MAX_ROWS: &str = "ORACLE_MAX_MAX_ROWS";
pub const ENV_SCHEMA_DEFAULT_MAX_HITS: &str = "ORACLE_SCHEMA_DEFAULT_MAX_HITS";
pub const ENV_SCHEMA_MAX_MAX_HITS: &str = "ORACLE_SCHEMA_MAX_MAX_HITS";

pub const DEFAULT_COMMAND_TIMEOUT_SECS: u32 = 30;
pub const DEFAULT_MAX_ROWS: u32 = 200;
pub const DEFAULT_MAX_MAX_ROWS: u32 = 2000;
pub const DEFAULT_SCHEMA_MAX_HITS: u32 = 50;
pub const DEFAULT_SCHEMA_MAX_MAX_HITS: u32 = 200;

/// Settings for a single tool invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Contains credentials - never log
    connection_string: String,
    pub command_timeout_secs: u32,
    pub default_max_rows: u32,
    pub max_max_rows: u32,
    pub schema_default_max_hits: u32,
    pub schema_max_max_hits: u32,
}

impl ConnectionOptions {
    /// Options with default limits for the given connection string.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            default_max_rows: DEFAULT_MAX_ROWS,
            max_max_rows: DEFAULT_MAX_MAX_ROWS,
            schema_default_max_hits: DEFAULT_SCHEMA_MAX_HITS,
            schema_max_max_hits: DEFAULT_SCHEMA_MAX_MAX_HITS,
        }
    }

    /// Read options from the process environment.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read options through an arbitrary key lookup.
    ///
    /// The connection string is required. Numeric settings that are missing,
    /// unparseable or not positive fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let connection_string = lookup(ENV_CONNECTION_STRING)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                DbError::configuration(format!(
                    "Missing {ENV_CONNECTION_STRING} environment variable."
                ))
            })?;

        let positive = |key: &str, default: u32| {
            lookup(key)
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .filter(|value| *value > 0)
                .map_or(default, |value| u32::try_from(value).unwrap_or(u32::MAX))
        };

        Ok(Self {
            connection_string,
            command_timeout_secs: positive(
                ENV_COMMAND_TIMEOUT_SECONDS,
                DEFAULT_COMMAND_TIMEOUT_SECS,
            ),
            default_max_rows: positive(ENV_DEFAULT_MAX_ROWS, DEFAULT_MAX_ROWS),
            max_max_rows: positive(ENV_MAX_MAX_ROWS, DEFAULT_MAX_MAX_ROWS),
            schema_default_max_hits: positive(
                ENV_SCHEMA_DEFAULT_MAX_HITS,
                DEFAULT_SCHEMA_MAX_HITS,
            ),
            schema_max_max_hits: positive(
                ENV_SCHEMA_MAX_MAX_HITS,
                DEFAULT_SCHEMA_MAX_MAX_HITS,
            ),
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.command_timeout_secs))
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("connection_string", &"****")
            .field("command_timeout_secs", &self.command_timeout_secs)
            .field("default_max_rows", &self.default_max_rows)
            .field("max_max_rows", &self.max_max_rows)
            .field("schema_default_max_hits", &self.schema_default_max_hits)
            .field("schema_max_max_hits", &self.schema_max_max_hits)
            .finish()
    }
}

/// Where tool handlers get their per-call options from.
pub trait OptionsSource: Send + Sync {
    fn load(&self) -> DbResult<ConnectionOptions>;
}

/// Reads `ORACLE_*` variables from the process environment on each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvOptionsSource;

impl OptionsSource for EnvOptionsSource {
    fn load(&self) -> DbResult<ConnectionOptions> {
        ConnectionOptions::from_env()
    }
}

/// Fixed options, mostly useful for tests and embedding.
impl OptionsSource for ConnectionOptions {
    fn load(&self) -> DbResult<ConnectionOptions> {
        Ok(self.clone())
    }
}
