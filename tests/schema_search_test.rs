//! Integration tests for the two-phase schema keyword search.
//!
//! Tables are searched first, then columns with whatever hit budget is left.

mod common;

use common::{FakeDriver, Script, text};
use oracle_mcp_server::models::{MatchType, QueryParam, SchemaSearchRequest};
use oracle_mcp_server::tools::SchemaToolHandler;
use tokio_util::sync::CancellationToken;

const TABLE_COLUMNS: &[(&str, Option<&str>)] =
    &[("OWNER", Some("VARCHAR2")), ("TABLE_NAME", Some("VARCHAR2"))];
const COLUMN_COLUMNS: &[(&str, Option<&str>)] = &[
    ("OWNER", Some("VARCHAR2")),
    ("TABLE_NAME", Some("VARCHAR2")),
    ("COLUMN_NAME", Some("VARCHAR2")),
    ("DATA_TYPE", Some("VARCHAR2")),
];

fn search(keyword: &str, owner: Option<&str>, max_hits: Option<i64>) -> SchemaSearchRequest {
    SchemaSearchRequest {
        keyword: keyword.to_string(),
        owner: owner.map(str::to_string),
        max_hits,
    }
}

/// Test that table hits come first and the column phase gets the remaining budget.
#[tokio::test]
async fn test_tables_then_columns_with_remaining_budget() {
    let driver = FakeDriver::new();
    driver
        .push(Script::table(
            TABLE_COLUMNS,
            vec![
                vec![text("HR"), text("EMPLOYEES")],
                vec![text("HR"), text("EMP_HISTORY")],
            ],
        ))
        .push(Script::table(
            COLUMN_COLUMNS,
            vec![vec![
                text("HR"),
                text("DEPARTMENTS"),
                text("EMP_COUNT"),
                text("NUMBER"),
            ]],
        ));
    let handler = SchemaToolHandler::new(driver.provider());

    let response = handler
        .search(search("  emp ", Some("hr"), Some(10)), &CancellationToken::new())
        .await;

    let hits = &response.result().expect("search should succeed").hits;
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].match_type, MatchType::Table);
    assert_eq!(hits[0].table_name, "EMPLOYEES");
    assert_eq!(hits[1].match_type, MatchType::Table);
    assert_eq!(hits[2].match_type, MatchType::Column);
    assert_eq!(hits[2].column_name.as_deref(), Some("EMP_COUNT"));
    assert_eq!(hits[2].data_type.as_deref(), Some("NUMBER"));

    let executed = driver.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].sql().contains("from all_tables"));
    assert!(executed[1].sql().contains("from all_tab_columns"));
    for statement in &executed {
        assert_eq!(statement.bind_value("kw"), Some(&QueryParam::String("EMP".into())));
        assert_eq!(statement.bind_value("owner"), Some(&QueryParam::String("HR".into())));
    }
    assert_eq!(executed[0].bind_value("limit"), Some(&QueryParam::Int(10)));
    assert_eq!(executed[1].bind_value("limit"), Some(&QueryParam::Int(8)));
    assert_eq!(driver.closes(), 1);
}

/// Test that the owner filter is omitted when no owner is given.
#[tokio::test]
async fn test_no_owner_filter() {
    let driver = FakeDriver::new();
    let handler = SchemaToolHandler::new(driver.provider());

    let response = handler
        .search(search("dept", Some("   "), None), &CancellationToken::new())
        .await;

    assert!(response.is_success());
    let executed = driver.executed();
    assert_eq!(executed.len(), 2);
    for statement in &executed {
        assert!(statement.bind_value("owner").is_none());
        assert!(!statement.sql().contains(":owner"));
        assert_eq!(statement.bind_value("limit"), Some(&QueryParam::Int(50)));
    }
}

/// Test that a blank keyword returns no hits without touching the database.
#[tokio::test]
async fn test_blank_keyword_returns_empty() {
    let driver = FakeDriver::new();
    let handler = SchemaToolHandler::new(driver.provider());

    let response = handler
        .search(search("   ", None, None), &CancellationToken::new())
        .await;

    assert!(response.result().expect("blank keyword is not an error").hits.is_empty());
    assert_eq!(driver.opens(), 0);
}

/// Test that the column phase is skipped once the table phase fills the budget.
#[tokio::test]
async fn test_budget_exhausted_by_tables() {
    let driver = FakeDriver::new();
    driver.push(Script::table(
        TABLE_COLUMNS,
        vec![
            vec![text("HR"), text("EMP_A")],
            vec![text("HR"), text("EMP_B")],
        ],
    ));
    let handler = SchemaToolHandler::new(driver.provider());

    let response = handler
        .search(search("emp", None, Some(2)), &CancellationToken::new())
        .await;

    assert_eq!(response.result().unwrap().hits.len(), 2);
    assert_eq!(driver.executed().len(), 1);
}

/// Test that a catalog query failure carries the schema search headline.
#[tokio::test]
async fn test_failure_headline() {
    let driver = FakeDriver::new();
    driver.push(Script::ExecutionError("ORA-00942: table or view does not exist"));
    let handler = SchemaToolHandler::new(driver.provider());

    let response = handler
        .search(search("emp", None, None), &CancellationToken::new())
        .await;

    let error = response.error().expect("search must fail");
    assert_eq!(error.message, "Oracle schema search failed.");
    assert_eq!(
        error.details.as_deref(),
        Some("ORA-00942: table or view does not exist")
    );
    assert_eq!(driver.closes(), 1);
}
