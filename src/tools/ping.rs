//! Connectivity check for `oracle_ping`.

use crate::db::connection::{self, BoundStatement, ConnectionProvider};
use crate::error::DbResult;
use crate::models::{PingResult, ToolResponse};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Identity query run after the connection opens. Its failure does not fail the ping.
pub const DATABASE_NAME_SQL: &str = "select sys_context('userenv','db_name') as db_name from dual";

pub struct PingToolHandler {
    provider: ConnectionProvider,
}

impl PingToolHandler {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    pub async fn ping(&self, cancel: &CancellationToken) -> ToolResponse<PingResult> {
        match self.execute(cancel).await {
            Ok(result) => ToolResponse::success(result),
            Err(e) => {
                warn!(error = %e, code = e.code(), "Ping failed");
                ToolResponse::failure(e)
            }
        }
    }

    async fn execute(&self, cancel: &CancellationToken) -> DbResult<PingResult> {
        let options = self.provider.load_options()?;
        let mut conn = self.provider.open(&options, cancel).await?;

        let lookup = conn
            .fetch_scalar(&BoundStatement::new(DATABASE_NAME_SQL), cancel)
            .await;
        connection::release(conn).await;

        let database_info = match lookup {
            Ok(value) => value.to_text(),
            Err(e) => {
                debug!(error = %e, "Database name lookup failed");
                None
            }
        };

        info!(
            driver = self.provider.driver_name(),
            database = database_info.as_deref().unwrap_or("unknown"),
            "Ping succeeded"
        );

        Ok(PingResult {
            ok: true,
            database_info,
        })
    }
}
