//! Configuration handling for the Oracle MCP Server.
//!
//! Process-level settings (transport, HTTP binding, logging, auth) come from CLI
//! arguments and environment variables. Database settings are not part of this
//! struct; they are read per call, see [`crate::models::ConnectionOptions`].

use crate::error::{DbError, DbResult};
use clap::{Parser, ValueEnum};
use url::Url;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for remote clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "oracle-mcp-server",
    about = "MCP server for read-only Oracle access - lets AI assistants query and explore Oracle schemas safely",
    after_help = "Database settings are read from the environment on every call:\n  \
        ORACLE_CONNECTION_STRING (required), ORACLE_COMMAND_TIMEOUT_SECONDS, ORACLE_DEFAULT_MAX_ROWS,\n  \
        ORACLE_MAX_MAX_ROWS, ORACLE_SCHEMA_DEFAULT_MAX_HITS, ORACLE_SCHEMA_MAX_MAX_HITS",
    version,
    author
)]
pub struct Config {
    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// Full listen URL, e.g. http://0.0.0.0:5000. Overrides --http-host and --http-port.
    #[arg(long, value_name = "URL", env = "MCP_HTTP_URL")]
    pub http_url: Option<String>,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Enable logging output to stderr (disabled by default)
    #[arg(long, env = "MCP_ENABLE_LOGS")]
    pub enable_logs: bool,

    /// Authentication tokens for HTTP transport.
    /// Can be specified multiple times or as comma-separated values.
    /// When set, all MCP requests must include a valid Bearer token.
    #[arg(
        long = "auth-token",
        value_name = "TOKEN",
        env = "MCP_AUTH_TOKENS",
        value_delimiter = ','
    )]
    pub auth_tokens: Vec<String>,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            http_url: None,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            enable_logs: false,
            auth_tokens: Vec::new(),
        }
    }

    /// Get the HTTP bind address, honoring `--http-url` when given.
    pub fn http_bind_addr(&self) -> DbResult<String> {
        let Some(raw) = self.http_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(format!("{}:{}", self.http_host, self.http_port));
        };

        let url = Url::parse(raw.trim())
            .map_err(|e| DbError::configuration(format!("Invalid MCP_HTTP_URL '{raw}': {e}")))?;
        if url.scheme() != "http" {
            return Err(DbError::configuration(format!(
                "MCP_HTTP_URL must use http, got '{}'",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| DbError::configuration(format!("MCP_HTTP_URL '{raw}' has no host")))?;
        let port = url.port_or_known_default().unwrap_or(self.http_port);
        Ok(format!("{host}:{port}"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
