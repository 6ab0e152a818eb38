//! Data models for the Oracle MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod ping;
pub mod query;
pub mod response;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionOptions, EnvOptionsSource, OptionsSource};
pub use ping::PingResult;
pub use query::{ColumnInfo, QueryParam, QueryRequest, QueryResult, Row};
pub use response::{ToolError, ToolResponse};
pub use schema::{MatchType, SchemaHit, SchemaSearchRequest, SchemaSearchResult};
