//! Schema search data models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input for the `oracle_search_schema` tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SchemaSearchRequest {
    /// Substring to look for in table and column names. Case-insensitive.
    pub keyword: String,

    /// Restrict the search to one schema owner, e.g. HR.
    #[serde(default)]
    pub owner: Option<String>,

    /// Maximum hits across tables and columns.
    #[serde(default)]
    pub max_hits: Option<i64>,
}

/// Whether a hit came from the table scan or the column scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Table,
    Column,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaHit {
    pub owner: String,
    pub table_name: String,
    pub match_type: MatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl SchemaHit {
    pub fn table(owner: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            table_name: table_name.into(),
            match_type: MatchType::Table,
            column_name: None,
            data_type: None,
        }
    }

    pub fn column(
        owner: impl Into<String>,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type: Option<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            table_name: table_name.into(),
            match_type: MatchType::Column,
            column_name: Some(column_name.into()),
            data_type,
        }
    }
}

/// Table hits first, then column hits, each in catalog order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaSearchResult {
    pub hits: Vec<SchemaHit>,
}
