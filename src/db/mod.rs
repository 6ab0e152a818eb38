//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection factory and per-call connections
//! - Connection string parsing
//! - Result mapping and JSON coercion
//! - The Oracle backend (behind the `oracle` feature)

pub mod connect_string;
pub mod connection;
pub mod mapper;
#[cfg(feature = "oracle")]
pub mod oracle;
pub mod types;

pub use connection::{
    BoundStatement, ConnectionFactory, ConnectionProvider, DbConnection, NamedBind,
    UnavailableFactory, default_factory,
};
pub use mapper::{ColumnSource, FetchedRows, RowCursor};
pub use types::{DbValue, coerce_to_json};
