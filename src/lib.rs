//! Oracle MCP Server Library
//!
//! MCP (Model Context Protocol) tools that give AI assistants read-only access
//! to an Oracle database: a connectivity ping, guarded SELECT queries with a
//! row cap, and keyword search over table and column names.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::OracleService;
