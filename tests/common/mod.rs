//! Scripted in-memory driver shared by the integration tests.
//!
//! Each `fetch` pops the next scripted outcome and records the statement it was
//! given, so tests can assert on the exact SQL and binds the tools produce.

#![allow(dead_code)]

use async_trait::async_trait;
use oracle_mcp_server::db::mapper::{self, ColumnSource, FetchedRows, RowCursor};
use oracle_mcp_server::db::{
    BoundStatement, ConnectionFactory, ConnectionProvider, DbConnection, DbValue,
};
use oracle_mcp_server::error::{DbError, DbResult};
use oracle_mcp_server::models::{ConnectionOptions, OptionsSource};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// One scripted outcome for a `fetch` or `fetch_scalar` call.
pub enum Script {
    Table {
        columns: Vec<(&'static str, Option<&'static str>)>,
        rows: Vec<Vec<DbValue>>,
    },
    /// Table whose cursor cancels the request after yielding its first row.
    CancelAfterFirstRow {
        columns: Vec<(&'static str, Option<&'static str>)>,
        rows: Vec<Vec<DbValue>>,
    },
    Scalar(DbValue),
    ExecutionError(&'static str),
}

impl Script {
    pub fn table(
        columns: &[(&'static str, Option<&'static str>)],
        rows: Vec<Vec<DbValue>>,
    ) -> Self {
        Self::Table {
            columns: columns.to_vec(),
            rows,
        }
    }
}

#[derive(Default)]
struct FakeState {
    scripts: VecDeque<Script>,
    executed: Vec<BoundStatement>,
    opens: usize,
    closes: usize,
    open_error: Option<&'static str>,
}

/// Handle for scripting the fake driver and inspecting what it saw.
#[derive(Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, script: Script) -> &Self {
        self.state.lock().unwrap().scripts.push_back(script);
        self
    }

    pub fn fail_open(&self, message: &'static str) {
        self.state.lock().unwrap().open_error = Some(message);
    }

    pub fn executed(&self) -> Vec<BoundStatement> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    /// Provider with default limits and a dummy connection string.
    pub fn provider(&self) -> ConnectionProvider {
        self.provider_with(ConnectionOptions::new("User Id=scott;Password=tiger;Data Source=db"))
    }

    pub fn provider_with(&self, options: impl OptionsSource + 'static) -> ConnectionProvider {
        ConnectionProvider::new(Arc::new(options), Arc::new(self.clone()))
    }

    fn next_script(&self, statement: &BoundStatement) -> Option<Script> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(statement.clone());
        state.scripts.pop_front()
    }
}

#[async_trait]
impl ConnectionFactory for FakeDriver {
    async fn open(
        &self,
        _options: &ConnectionOptions,
        _cancel: &CancellationToken,
    ) -> DbResult<Box<dyn DbConnection>> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.open_error {
            return Err(DbError::connection(message));
        }
        state.opens += 1;
        Ok(Box::new(FakeConnection {
            driver: self.clone(),
        }))
    }

    fn driver_name(&self) -> &'static str {
        "fake"
    }
}

struct FakeConnection {
    driver: FakeDriver,
}

#[async_trait]
impl DbConnection for FakeConnection {
    async fn fetch(
        &mut self,
        statement: &BoundStatement,
        max_rows: usize,
        cancel: &CancellationToken,
    ) -> DbResult<FetchedRows> {
        match self.driver.next_script(statement) {
            Some(Script::Table { columns, rows }) => {
                let mut cursor = FakeCursor {
                    columns,
                    rows: rows.into(),
                    cancel_after_first: None,
                };
                mapper::collect_rows(&mut cursor, max_rows, cancel)
            }
            Some(Script::CancelAfterFirstRow { columns, rows }) => {
                let mut cursor = FakeCursor {
                    columns,
                    rows: rows.into(),
                    cancel_after_first: Some(cancel.clone()),
                };
                mapper::collect_rows(&mut cursor, max_rows, cancel)
            }
            Some(Script::ExecutionError(message)) => Err(DbError::execution(message)),
            Some(Script::Scalar(_)) => Err(DbError::internal("scalar scripted for fetch")),
            None => Ok(FetchedRows::default()),
        }
    }

    async fn fetch_scalar(
        &mut self,
        statement: &BoundStatement,
        _cancel: &CancellationToken,
    ) -> DbResult<DbValue> {
        match self.driver.next_script(statement) {
            Some(Script::Scalar(value)) => Ok(value),
            Some(Script::ExecutionError(message)) => Err(DbError::execution(message)),
            Some(Script::Table { .. } | Script::CancelAfterFirstRow { .. }) => {
                Err(DbError::internal("table scripted for scalar"))
            }
            None => Ok(DbValue::Null),
        }
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        self.driver.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

struct FakeCursor {
    columns: Vec<(&'static str, Option<&'static str>)>,
    rows: VecDeque<Vec<DbValue>>,
    cancel_after_first: Option<CancellationToken>,
}

impl ColumnSource for FakeCursor {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, index: usize) -> String {
        self.columns[index].0.to_string()
    }

    fn column_type_name(&self, index: usize) -> DbResult<String> {
        self.columns[index]
            .1
            .map(str::to_string)
            .ok_or_else(|| DbError::internal("type not described"))
    }
}

impl RowCursor for FakeCursor {
    fn next_row(&mut self) -> DbResult<Option<Vec<DbValue>>> {
        let row = self.rows.pop_front();
        if let Some(cancel) = self.cancel_after_first.take() {
            cancel.cancel();
        }
        Ok(row)
    }
}

/// Options source that always fails, like a missing environment variable.
pub struct MissingOptions;

impl OptionsSource for MissingOptions {
    fn load(&self) -> DbResult<ConnectionOptions> {
        ConnectionOptions::from_lookup(|_| None)
    }
}

pub fn text(value: &str) -> DbValue {
    DbValue::Text(value.to_string())
}
