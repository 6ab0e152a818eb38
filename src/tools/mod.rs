//! MCP tool implementations.
//!
//! This module contains all Oracle tool handlers:
//! - `ping`: Check connectivity and report the database name
//! - `query`: Execute read-only SELECT / WITH queries
//! - `schema`: Search table and column names
//! - `sql_guard`: Lexical read-only classification and the row-cap rewrite

pub mod ping;
pub mod query;
pub mod schema;
pub mod sql_guard;

pub use ping::PingToolHandler;
pub use query::QueryToolHandler;
pub use schema::SchemaToolHandler;
pub use sql_guard::{GuardRejection, validate_read_only};
