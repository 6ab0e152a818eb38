//! MCP service implementation using rmcp.
//!
//! This module defines the OracleService struct with the Oracle tools exposed via
//! the MCP protocol using the rmcp framework's macros. Every tool answers with the
//! `{ok, result | error}` envelope as JSON text; failures also set `is_error`.

use crate::db::ConnectionProvider;
use crate::models::{QueryRequest, SchemaSearchRequest, ToolResponse};
use crate::tools::{PingToolHandler, QueryToolHandler, SchemaToolHandler};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use tracing::{Instrument, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct OracleService {
    /// Options source and connection factory shared by all tools
    provider: ConnectionProvider,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl OracleService {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self {
            provider,
            tool_router: Self::tool_router(),
        }
    }
}

/// Render an envelope as tool output.
fn respond<T: Serialize>(response: ToolResponse<T>) -> Result<CallToolResult, McpError> {
    let content = Content::json(&response)?;
    Ok(if response.is_success() {
        CallToolResult::success(vec![content])
    } else {
        CallToolResult::error(vec![content])
    })
}

#[tool_router]
impl OracleService {
    #[tool(
        name = "oracle_ping",
        description = "Check that the Oracle database is reachable.\nReturns ok=true and the database name when the connection succeeds."
    )]
    async fn oracle_ping(
        &self,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let span = info_span!("tool", name = "oracle_ping", call_id = %Uuid::new_v4());
        let handler = PingToolHandler::new(self.provider.clone());
        let response = handler.ping(&context.ct).instrument(span).await;
        respond(response)
    }

    #[tool(
        name = "oracle_query",
        description = "Run a read-only SQL query against Oracle.\nOnly a single SELECT or WITH ... SELECT statement is accepted; no semicolons, no DML, DDL or PL/SQL.\nUse named binds (:name) with the `parameters` map instead of inlining values.\nRows are capped by `max_rows` (server default 200, ceiling 2000); `truncated` is true when the cap was reached."
    )]
    async fn oracle_query(
        &self,
        Parameters(input): Parameters<QueryRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let span = info_span!("tool", name = "oracle_query", call_id = %Uuid::new_v4());
        let handler = QueryToolHandler::new(self.provider.clone());
        let response = handler.query(input, &context.ct).instrument(span).await;
        respond(response)
    }

    #[tool(
        name = "oracle_search_schema",
        description = "Find tables and columns whose names contain a keyword (case-insensitive).\nOptionally restrict to one schema owner. Table matches are listed before column matches.\nReturns at most `max_hits` results (default 50, ceiling 200)."
    )]
    async fn oracle_search_schema(
        &self,
        Parameters(input): Parameters<SchemaSearchRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let span = info_span!("tool", name = "oracle_search_schema", call_id = %Uuid::new_v4());
        let handler = SchemaToolHandler::new(self.provider.clone());
        let response = handler.search(input, &context.ct).instrument(span).await;
        respond(response)
    }
}

#[tool_handler]
impl ServerHandler for OracleService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "oracle-mcp-server".to_owned(),
                title: Some("Oracle MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only tools for an Oracle database.\n\
                \n\
                ## Workflow\n\
                1. Call `oracle_ping` to confirm the database is reachable\n\
                2. Use `oracle_search_schema` to find tables and columns by keyword\n\
                3. Use `oracle_query` to run SELECT statements\n\
                \n\
                ## Query Rules\n\
                - One statement only, starting with SELECT or WITH; no trailing semicolon\n\
                - INSERT, UPDATE, DELETE, MERGE, DDL, PL/SQL and SELECT ... FOR UPDATE are rejected\n\
                - Pass values as named binds: `where deptno = :dept` with parameters {\"dept\": 10}\n\
                - `mcp_max_rows` is reserved for the row cap\n\
                \n\
                ## Results\n\
                Every tool returns {\"ok\": true, \"result\": ...} or {\"ok\": false, \"error\": {\"message\", \"details\"}}.\n\
                Dates are ISO-8601 strings and binary values are base64."
                    .to_string(),
            ),
        }
    }
}
