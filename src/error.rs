//! Error types for the Oracle MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every variant is recoverable at the tool boundary: handlers convert them into a
//! [`ToolError`] inside a failure envelope instead of propagating them to the transport.

use crate::models::ToolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Missing or invalid connection settings.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// SQL rejected by the read-only guard.
    #[error("SQL rejected: {reason}")]
    Validation { reason: String },

    /// The Oracle driver or client library cannot be used.
    #[error("Oracle driver unavailable: {message}")]
    DriverUnavailable { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    /// Statement failed while executing or fetching. Carries only the root-cause message.
    #[error("Execution failed: {message}")]
    Execution { message: String },

    #[error("Cancelled during {operation}")]
    Cancelled { operation: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error carrying the guard's rejection reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Create a driver unavailable error.
    pub fn driver_unavailable(message: impl Into<String>) -> Self {
        Self::DriverUnavailable {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Create a cancellation error for the given suspension point.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code reported alongside the tool error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::Validation { .. } => "non_readonly_sql",
            Self::DriverUnavailable { .. } => "missing_oracle_driver",
            Self::Connection { .. } => "connection_failed",
            Self::Execution { .. } => "query_failed",
            Self::Cancelled { .. } => "cancelled",
            Self::Internal { .. } => "internal_error",
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Message of the innermost error in a `source()` chain.
///
/// Driver errors wrap each other several layers deep; only the base message is
/// surfaced to callers.
pub fn root_cause_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

impl From<DbError> for ToolError {
    fn from(err: DbError) -> Self {
        let code = err.code();
        let tool_error = match err {
            // The configuration message is already caller-facing.
            DbError::Configuration { message } => ToolError::new(message),
            DbError::Validation { reason } => ToolError::with_details(
                "Only read-only SQL is allowed (SELECT / WITH ... SELECT).",
                reason,
            ),
            DbError::DriverUnavailable { message } => ToolError::with_details(
                "Oracle driver not available. Build with the `oracle` feature and install the Oracle client libraries.",
                message,
            ),
            DbError::Connection { message } => {
                ToolError::with_details("Failed to connect to Oracle.", message)
            }
            DbError::Execution { message } => ToolError::new(message),
            DbError::Cancelled { operation } => {
                ToolError::with_details("Request cancelled.", operation)
            }
            DbError::Internal { message } => ToolError::with_details("Internal error.", message),
        };
        tool_error.with_code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Layer {
        message: &'static str,
        source: Option<Box<Layer>>,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for Layer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.source
                .as_deref()
                .map(|s| s as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn test_error_display() {
        let err = DbError::connection("listener refused");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_root_cause_walks_to_innermost() {
        let err = Layer {
            message: "outer wrapper at driver.rs:42",
            source: Some(Box::new(Layer {
                message: "middle",
                source: Some(Box::new(Layer {
                    message: "ORA-00942: table or view does not exist",
                    source: None,
                })),
            })),
        };
        assert_eq!(
            root_cause_message(&err),
            "ORA-00942: table or view does not exist"
        );
    }

    #[test]
    fn test_root_cause_of_leaf_is_itself() {
        let err = Layer {
            message: "only",
            source: None,
        };
        assert_eq!(root_cause_message(&err), "only");
    }

    #[test]
    fn test_validation_maps_to_read_only_message() {
        let tool_error: ToolError =
            DbError::validation("SQL must start with SELECT or WITH.").into();
        assert!(tool_error.message.contains("read-only"));
        assert_eq!(
            tool_error.details.as_deref(),
            Some("SQL must start with SELECT or WITH.")
        );
        assert_eq!(tool_error.code.as_deref(), Some("non_readonly_sql"));
    }

    #[test]
    fn test_execution_keeps_only_message() {
        let tool_error: ToolError = DbError::execution("ORA-00904: invalid identifier").into();
        assert_eq!(tool_error.message, "ORA-00904: invalid identifier");
        assert!(tool_error.details.is_none());
        assert_eq!(tool_error.code.as_deref(), Some("query_failed"));
    }

    #[test]
    fn test_configuration_message_is_surfaced() {
        let tool_error: ToolError =
            DbError::configuration("Missing ORACLE_CONNECTION_STRING environment variable.")
                .into();
        assert_eq!(
            tool_error.message,
            "Missing ORACLE_CONNECTION_STRING environment variable."
        );
        assert_eq!(tool_error.code.as_deref(), Some("configuration_error"));
    }

    #[test]
    fn test_connection_maps_with_details() {
        let tool_error: ToolError = DbError::connection("ORA-12541: no listener").into();
        assert_eq!(tool_error.message, "Failed to connect to Oracle.");
        assert_eq!(tool_error.details.as_deref(), Some("ORA-12541: no listener"));
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            DbError::configuration("x").code(),
            DbError::validation("x").code(),
            DbError::driver_unavailable("x").code(),
            DbError::connection("x").code(),
            DbError::execution("x").code(),
            DbError::cancelled("x").code(),
            DbError::internal("x").code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
