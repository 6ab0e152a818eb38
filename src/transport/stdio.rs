//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::db::ConnectionProvider;
use crate::error::{DbError, DbResult};
use crate::mcp::OracleService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout, following the MCP protocol specification.
pub struct StdioTransport {
    provider: ConnectionProvider,
}

impl StdioTransport {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!(driver = self.provider.driver_name(), "Starting MCP server with stdio transport");

        let service = OracleService::new(self.provider.clone());
        let running_service = service
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {e}")))?;

        tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => info!("Stdio transport completed normally"),
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        return Err(DbError::internal(format!("Stdio transport error: {e}")));
                    }
                }
            }
            _ = wait_for_signal() => {
                // No connections are held between calls, so there is nothing to drain.
                // tokio::select! cannot interrupt a blocking stdin read, so exit directly.
                info!("Shutdown signal received, exiting");
                std::process::exit(0);
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UnavailableFactory;
    use crate::models::ConnectionOptions;
    use std::sync::Arc;

    #[test]
    fn test_stdio_transport_creation() {
        let provider = ConnectionProvider::new(
            Arc::new(ConnectionOptions::new("x")),
            Arc::new(UnavailableFactory::new("test")),
        );
        let transport = StdioTransport::new(provider);
        assert_eq!(transport.name(), "stdio");
    }
}
