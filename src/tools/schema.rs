//! Schema keyword search tool.
//!
//! Implements `oracle_search_schema`: a case-insensitive substring search over
//! `all_tables`, then over `all_tab_columns`, sharing one hit budget. Table hits
//! always come first.

use crate::db::connection::{self, BoundStatement, ConnectionProvider, DbConnection};
use crate::error::{DbError, DbResult};
use crate::models::{
    QueryParam, Row, SchemaHit, SchemaSearchRequest, SchemaSearchResult, ToolError, ToolResponse,
};
use crate::tools::sql_guard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const TABLE_SEARCH_SQL: &str =
    "select owner, table_name from all_tables where upper(table_name) like '%' || :kw || '%'";

const COLUMN_SEARCH_SQL: &str = "select owner, table_name, column_name, data_type \
     from all_tab_columns where (upper(column_name) like '%' || :kw || '%' or upper(table_name) like '%' || :kw || '%')";

const OWNER_FILTER: &str = " and owner = :owner";

/// Which catalog view a scan reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Tables,
    Columns,
}

impl SearchPhase {
    /// Catalog SQL for this phase, capped by `:limit`.
    pub fn sql(self, with_owner: bool) -> String {
        let base = match self {
            Self::Tables => TABLE_SEARCH_SQL,
            Self::Columns => COLUMN_SEARCH_SQL,
        };
        let filter = if with_owner { OWNER_FILTER } else { "" };
        format!("select * from ({base}{filter}) where rownum <= :limit")
    }
}

pub struct SchemaToolHandler {
    provider: ConnectionProvider,
}

impl SchemaToolHandler {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    pub async fn search(
        &self,
        request: SchemaSearchRequest,
        cancel: &CancellationToken,
    ) -> ToolResponse<SchemaSearchResult> {
        match self.execute(request, cancel).await {
            Ok(result) => ToolResponse::success(result),
            Err(e) => {
                warn!(error = %e, code = e.code(), "Schema search failed");
                let execution_failure = matches!(e, DbError::Execution { .. });
                let error = ToolError::from(e);
                ToolResponse::failure(if execution_failure {
                    error.headline("Oracle schema search failed.")
                } else {
                    error
                })
            }
        }
    }

    async fn execute(
        &self,
        request: SchemaSearchRequest,
        cancel: &CancellationToken,
    ) -> DbResult<SchemaSearchResult> {
        let keyword = request.keyword.trim().to_uppercase();
        if keyword.is_empty() {
            debug!("Blank schema search keyword");
            return Ok(SchemaSearchResult::default());
        }

        let options = self.provider.load_options()?;
        let requested = request
            .max_hits
            .unwrap_or_else(|| i64::from(options.schema_default_max_hits));
        let max_hits = sql_guard::clamp_row_count(requested, options.schema_max_max_hits);
        let owner = request
            .owner
            .as_deref()
            .map(|o| o.trim().to_uppercase())
            .filter(|o| !o.is_empty());

        let mut conn = self.provider.open(&options, cancel).await?;
        let result = search_catalog(
            conn.as_mut(),
            &keyword,
            owner.as_deref(),
            max_hits,
            cancel,
        )
        .await;
        connection::release(conn).await;
        let hits = result?;

        info!(
            keyword = %keyword,
            owner = owner.as_deref().unwrap_or("*"),
            hits = hits.len(),
            max_hits,
            "Schema searched"
        );

        Ok(SchemaSearchResult { hits })
    }
}

/// Run both scans on an open connection, stopping once `max_hits` is reached.
pub async fn search_catalog(
    conn: &mut dyn DbConnection,
    keyword: &str,
    owner: Option<&str>,
    max_hits: u32,
    cancel: &CancellationToken,
) -> DbResult<Vec<SchemaHit>> {
    let budget = max_hits as usize;
    let mut hits = Vec::new();

    for phase in [SearchPhase::Tables, SearchPhase::Columns] {
        let remaining = budget.saturating_sub(hits.len());
        if remaining == 0 {
            break;
        }

        let statement = phase_statement(phase, keyword, owner, remaining);
        let fetched = conn.fetch(&statement, remaining, cancel).await?;
        debug!(?phase, rows = fetched.rows.len(), "Catalog scan finished");

        for row in &fetched.rows {
            hits.push(hit_from_row(phase, row)?);
        }
    }

    hits.truncate(budget);
    Ok(hits)
}

fn phase_statement(
    phase: SearchPhase,
    keyword: &str,
    owner: Option<&str>,
    limit: usize,
) -> BoundStatement {
    let mut statement = BoundStatement::new(phase.sql(owner.is_some()))
        .bind_internal("kw", QueryParam::String(keyword.to_string()));
    if let Some(owner) = owner {
        statement = statement.bind_internal("owner", QueryParam::String(owner.to_string()));
    }
    statement.bind_internal(
        "limit",
        QueryParam::Int(i64::try_from(limit).unwrap_or(i64::MAX)),
    )
}

fn hit_from_row(phase: SearchPhase, row: &Row) -> DbResult<SchemaHit> {
    let owner = required_text(row, "OWNER")?;
    let table_name = required_text(row, "TABLE_NAME")?;
    Ok(match phase {
        SearchPhase::Tables => SchemaHit::table(owner, table_name),
        SearchPhase::Columns => SchemaHit::column(
            owner,
            table_name,
            required_text(row, "COLUMN_NAME")?,
            row.get_str("DATA_TYPE").map(str::to_string),
        ),
    })
}

fn required_text<'a>(row: &'a Row, column: &str) -> DbResult<&'a str> {
    row.get_str(column)
        .ok_or_else(|| DbError::internal(format!("catalog row is missing {column}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_sql_without_owner() {
        assert_eq!(
            SearchPhase::Tables.sql(false),
            "select * from (select owner, table_name from all_tables where upper(table_name) like '%' || :kw || '%') where rownum <= :limit"
        );
    }

    #[test]
    fn test_column_sql_with_owner_applies_to_both_matches() {
        let sql = SearchPhase::Columns.sql(true);
        assert!(sql.contains("from all_tab_columns"));
        assert!(sql.contains("'%' || :kw || '%') and owner = :owner)"));
        assert!(sql.ends_with("where rownum <= :limit"));
    }

    #[test]
    fn test_phase_statement_binds() {
        let statement = phase_statement(SearchPhase::Tables, "EMP", Some("HR"), 10);
        assert_eq!(
            statement.bind_value("kw"),
            Some(&QueryParam::String("EMP".into()))
        );
        assert_eq!(
            statement.bind_value("owner"),
            Some(&QueryParam::String("HR".into()))
        );
        assert_eq!(statement.bind_value("limit"), Some(&QueryParam::Int(10)));

        let statement = phase_statement(SearchPhase::Columns, "EMP", None, 3);
        assert!(statement.bind_value("owner").is_none());
    }

    #[test]
    fn test_hit_from_column_row() {
        let mut row = Row::default();
        row.insert("OWNER", json!("HR"));
        row.insert("TABLE_NAME", json!("DEPT"));
        row.insert("COLUMN_NAME", json!("EMP_COUNT"));
        row.insert("DATA_TYPE", json!(null));
        let hit = hit_from_row(SearchPhase::Columns, &row).unwrap();
        assert_eq!(hit, SchemaHit::column("HR", "DEPT", "EMP_COUNT", None));
    }

    #[test]
    fn test_hit_from_row_missing_owner() {
        let mut row = Row::default();
        row.insert("TABLE_NAME", json!("DEPT"));
        assert!(hit_from_row(SearchPhase::Tables, &row).is_err());
    }
}
