//! Query execution tool.
//!
//! This module implements the `oracle_query` MCP tool. The statement is checked by
//! the read-only guard, wrapped with a `rownum` cap and executed on a connection
//! opened for this call alone.

use crate::db::connection::{self, BoundStatement, ConnectionProvider};
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, QueryRequest, QueryResult, ToolResponse};
use crate::tools::sql_guard::{self, ROW_LIMIT_BIND};
use std::collections::BTreeMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Handler for query execution.
#[derive(Debug, Clone)]
pub struct QueryToolHandler {
    provider: ConnectionProvider,
}

impl QueryToolHandler {
    /// Create a new query tool handler.
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Handle the query tool call.
    ///
    /// Never fails outright: every error becomes a failure envelope.
    pub async fn query(
        &self,
        request: QueryRequest,
        cancel: &CancellationToken,
    ) -> ToolResponse<QueryResult> {
        match self.execute(request, cancel).await {
            Ok(result) => ToolResponse::success(result),
            Err(e) => {
                warn!(error = %e, code = e.code(), "Query failed");
                ToolResponse::failure(e)
            }
        }
    }

    async fn execute(
        &self,
        request: QueryRequest,
        cancel: &CancellationToken,
    ) -> DbResult<QueryResult> {
        let options = self.provider.load_options()?;

        sql_guard::validate_read_only(&request.sql)
            .map_err(|rejection| DbError::validation(rejection.to_string()))?;

        let requested = request
            .max_rows
            .unwrap_or_else(|| i64::from(options.default_max_rows));
        let row_cap = sql_guard::clamp_row_count(requested, options.max_max_rows);
        let statement = build_statement(&request.sql, request.parameters.as_ref(), row_cap)?;
        debug!(row_cap, binds = statement.binds().len(), "Query accepted");

        let start = Instant::now();
        let mut conn = self.provider.open(&options, cancel).await?;
        let fetched = conn.fetch(&statement, row_cap as usize, cancel).await;
        connection::release(conn).await;
        let fetched = fetched?;

        let truncated = fetched.rows.len() == row_cap as usize;
        info!(
            row_count = fetched.rows.len(),
            columns = fetched.columns.len(),
            truncated,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );

        Ok(QueryResult {
            columns: fetched.columns,
            rows: fetched.rows,
            truncated,
        })
    }
}

/// Wrap accepted SQL with the row cap and bind the caller's parameters.
///
/// Caller binds come first, in name order, followed by the row-cap bind.
pub fn build_statement(
    sql: &str,
    parameters: Option<&BTreeMap<String, QueryParam>>,
    row_cap: u32,
) -> DbResult<BoundStatement> {
    let mut statement = BoundStatement::new(sql_guard::wrap_with_row_limit(sql));
    for (name, value) in parameters.into_iter().flatten() {
        statement = statement.bind(name, value.clone())?;
    }
    Ok(statement.bind_internal(ROW_LIMIT_BIND, QueryParam::Int(i64::from(row_cap))))
}
