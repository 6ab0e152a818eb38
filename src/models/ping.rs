use serde::Serialize;

/// Result of the `oracle_ping` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingResult {
    pub ok: bool,
    /// Database name from `sys_context('userenv','db_name')`. Absent when that lookup fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_info: Option<String>,
}
