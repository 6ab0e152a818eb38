//! HTTP transport with Streamable HTTP support for the MCP server.
//!
//! Serves the MCP endpoint and an unauthenticated `GET /healthz` health check.
//! Bearer auth, when configured, guards the MCP endpoint only.

use crate::auth::{AuthConfig, auth_middleware};
use crate::db::ConnectionProvider;
use crate::error::{DbError, DbResult};
use crate::mcp::OracleService;
use crate::transport::{Transport, wait_for_signal};
use axum::{Json, Router, routing::get};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

pub const HEALTH_PATH: &str = "/healthz";

/// Open connections (SSE streams in particular) get this long after a shutdown signal.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport implementation with Streamable HTTP support.
pub struct HttpTransport {
    provider: ConnectionProvider,
    /// `host:port` to bind to
    bind_addr: String,
    /// MCP endpoint path
    endpoint: String,
    auth: Arc<AuthConfig>,
}

impl HttpTransport {
    pub fn new(
        provider: ConnectionProvider,
        bind_addr: impl Into<String>,
        endpoint: impl Into<String>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            provider,
            bind_addr: bind_addr.into(),
            endpoint: endpoint.into(),
            auth: Arc::new(auth),
        }
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the axum application: MCP service (behind auth if enabled) plus health check.
    pub fn router(&self) -> Router {
        let provider = self.provider.clone();
        let service = StreamableHttpService::new(
            move || Ok(OracleService::new(provider.clone())),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service rejects "/", so the root endpoint goes through the fallback
        let mut mcp = if self.endpoint == "/" {
            Router::new().fallback_service(service)
        } else {
            Router::new().nest_service(&self.endpoint, service)
        };

        if self.auth.is_enabled() {
            mcp = mcp.layer(axum::middleware::from_fn_with_state(
                self.auth.clone(),
                auth_middleware,
            ));
        }

        Router::new().route(HEALTH_PATH, get(healthz)).merge(mcp)
    }
}

async fn healthz() -> Json<JsonValue> {
    Json(json!({ "ok": true }))
}

impl Transport for HttpTransport {
    async fn run(&self) -> DbResult<()> {
        info!(
            bind_addr = %self.bind_addr,
            driver = self.provider.driver_name(),
            auth_enabled = self.auth.is_enabled(),
            "Starting MCP server with HTTP transport"
        );

        let app = self.router();

        let listener = TcpListener::bind(&self.bind_addr).await.map_err(|e| {
            DbError::internal(format!("Failed to bind to {}: {e}", self.bind_addr))
        })?;

        info!(endpoint = %self.endpoint, health = HEALTH_PATH, "MCP endpoint ready");

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let notify = shutdown_notify.clone();
        let shutdown_signal = async move {
            wait_for_signal().await;
            notify.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(DbError::internal(format!("HTTP server error: {e}")));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)"
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
