//! Oracle MCP Server - Main entry point.
//!
//! Exposes read-only Oracle tools (ping, query, schema search) to AI assistants
//! over stdio or Streamable HTTP.

use oracle_mcp_server::auth::AuthConfig;
use oracle_mcp_server::config::{Config, TransportMode};
use oracle_mcp_server::db::ConnectionProvider;
use oracle_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber. Logs go to stderr; stdout carries the stdio protocol.
fn init_tracing(config: &Config) {
    if !config.enable_logs {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();

    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting Oracle MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Database settings are read per call, so a missing connection string
    // surfaces as a tool error rather than a startup failure.
    let provider = ConnectionProvider::from_env();

    let result = match config.transport {
        TransportMode::Stdio => StdioTransport::new(provider).run().await,
        TransportMode::Http => {
            let auth = AuthConfig::from_tokens(config.auth_tokens.clone())?;
            if auth.is_enabled() {
                info!(token_count = auth.token_count(), "Bearer authentication enabled");
            }
            let bind_addr = config.http_bind_addr()?;
            HttpTransport::new(provider, bind_addr, &config.mcp_endpoint, auth)
                .run()
                .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
