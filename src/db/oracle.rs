//! Oracle backend built on the `oracle` crate (ODPI-C).
//!
//! The client library is blocking, so every round trip runs on
//! `tokio::task::spawn_blocking`. The async side races that task against the
//! request's cancellation token and, when cancellation wins, asks the server to
//! abort the running call with `break_execution`.

use crate::db::connect_string::ConnectDescriptor;
use crate::db::connection::{BoundStatement, ConnectionFactory, DbConnection};
use crate::db::mapper::{self, ColumnSource, FetchedRows, RowCursor};
use crate::db::types::DbValue;
use crate::error::{DbError, DbResult, root_cause_message};
use crate::models::{ConnectionOptions, QueryParam};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use oracle::sql_type::{IntervalDS, IntervalYM, OracleType, ToSql};
use oracle::{Connection, ResultSet, Row, SqlValue};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Marker in the error raised when the Oracle client library cannot be loaded.
const CLIENT_LIBRARY_MISSING: &str = "DPI-1047";

/// Widest NUMBER precision that always fits in an i64.
const MAX_INT_PRECISION: u8 = 18;

#[derive(Debug, Clone, Copy, Default)]
pub struct OracleConnectionFactory;

impl OracleConnectionFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectionFactory for OracleConnectionFactory {
    async fn open(
        &self,
        options: &ConnectionOptions,
        cancel: &CancellationToken,
    ) -> DbResult<Box<dyn DbConnection>> {
        let descriptor = ConnectDescriptor::parse(options.connection_string())?;
        let call_timeout = options.command_timeout();
        debug!(
            user = %descriptor.username,
            target = %descriptor.connect_string,
            "Opening Oracle connection"
        );

        let task = tokio::task::spawn_blocking(move || {
            let conn = Connection::connect(
                &descriptor.username,
                &descriptor.password,
                &descriptor.connect_string,
            )
            .map_err(|e| classify(&e, DbError::connection))?;
            conn.set_call_timeout(Some(call_timeout))
                .map_err(|e| classify(&e, DbError::connection))?;
            Ok::<_, DbError>(conn)
        });

        // A connect in flight cannot be interrupted; the blocking task finishes on its
        // own and the connection is dropped with it.
        let conn = tokio::select! {
            joined = task => joined.map_err(join_error)??,
            _ = cancel.cancelled() => return Err(DbError::cancelled("connection open")),
        };

        Ok(Box::new(OracleConnection {
            inner: Arc::new(conn),
        }))
    }

    fn driver_name(&self) -> &'static str {
        "oracle"
    }
}

pub struct OracleConnection {
    inner: Arc<Connection>,
}

impl OracleConnection {
    async fn run<T: Send + 'static>(
        &self,
        task: JoinHandle<DbResult<T>>,
        cancel: &CancellationToken,
        operation: &str,
    ) -> DbResult<T> {
        tokio::select! {
            joined = task => joined.map_err(join_error)?,
            _ = cancel.cancelled() => {
                if let Err(e) = self.inner.break_execution() {
                    warn!(error = %e, "Failed to break Oracle execution");
                }
                Err(DbError::cancelled(operation))
            }
        }
    }
}

#[async_trait]
impl DbConnection for OracleConnection {
    async fn fetch(
        &mut self,
        statement: &BoundStatement,
        max_rows: usize,
        cancel: &CancellationToken,
    ) -> DbResult<FetchedRows> {
        debug!(sql = %statement.sql(), binds = statement.binds().len(), "Executing statement");
        let conn = Arc::clone(&self.inner);
        let statement = statement.clone();
        let token = cancel.clone();

        let task = tokio::task::spawn_blocking(move || {
            let binds = OwnedBinds::from_statement(&statement);
            let named = binds.as_named();
            let mut stmt = conn
                .statement(statement.sql())
                .build()
                .map_err(|e| classify(&e, DbError::execution))?;
            let rows = stmt
                .query_named(&named)
                .map_err(|e| classify(&e, DbError::execution))?;
            let mut cursor = OracleCursor::new(rows);
            mapper::collect_rows(&mut cursor, max_rows, &token)
        });

        self.run(task, cancel, "statement execution").await
    }

    async fn fetch_scalar(
        &mut self,
        statement: &BoundStatement,
        cancel: &CancellationToken,
    ) -> DbResult<DbValue> {
        debug!(sql = %statement.sql(), "Executing scalar query");
        let conn = Arc::clone(&self.inner);
        let statement = statement.clone();

        let task = tokio::task::spawn_blocking(move || {
            let binds = OwnedBinds::from_statement(&statement);
            let named = binds.as_named();
            let row = conn
                .query_row_named(statement.sql(), &named)
                .map_err(|e| classify(&e, DbError::execution))?;
            match row.sql_values().first() {
                Some(value) => convert_value(value),
                None => Ok(DbValue::Null),
            }
        });

        self.run(task, cancel, "scalar query").await
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        let conn = self.inner;
        tokio::task::spawn_blocking(move || conn.close())
            .await
            .map_err(join_error)?
            .map_err(|e| classify(&e, DbError::connection))
    }
}

// =============================================================================
// Binding
// =============================================================================

/// Bind values owned by the blocking task.
enum BindSlot {
    Null(Option<String>),
    Int(i64),
    Float(f64),
    Text(String),
}

impl BindSlot {
    fn as_sql(&self) -> &dyn ToSql {
        match self {
            Self::Null(v) => v,
            Self::Int(v) => v,
            Self::Float(v) => v,
            Self::Text(v) => v,
        }
    }
}

impl From<&QueryParam> for BindSlot {
    fn from(param: &QueryParam) -> Self {
        match param {
            QueryParam::Null => Self::Null(None),
            // Oracle SQL has no boolean type before 23ai.
            QueryParam::Bool(b) => Self::Int(i64::from(*b)),
            QueryParam::Int(i) => Self::Int(*i),
            QueryParam::Float(f) => Self::Float(*f),
            QueryParam::String(s) => Self::Text(s.clone()),
        }
    }
}

struct OwnedBinds(Vec<(String, BindSlot)>);

impl OwnedBinds {
    fn from_statement(statement: &BoundStatement) -> Self {
        Self(
            statement
                .binds()
                .iter()
                .map(|bind| (bind.name().to_string(), BindSlot::from(bind.value())))
                .collect(),
        )
    }

    fn as_named(&self) -> Vec<(&str, &dyn ToSql)> {
        self.0
            .iter()
            .map(|(name, slot)| (name.as_str(), slot.as_sql()))
            .collect()
    }
}

// =============================================================================
// Result Sets
// =============================================================================

struct OracleCursor<'a> {
    rows: ResultSet<'a, Row>,
    columns: Vec<(String, OracleType)>,
}

impl<'a> OracleCursor<'a> {
    fn new(rows: ResultSet<'a, Row>) -> Self {
        let columns = rows
            .column_info()
            .iter()
            .map(|info| (info.name().to_string(), info.oracle_type().clone()))
            .collect();
        Self { rows, columns }
    }
}

impl ColumnSource for OracleCursor<'_> {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, index: usize) -> String {
        self.columns
            .get(index)
            .map(|(name, _)| name.clone())
            .unwrap_or_default()
    }

    fn column_type_name(&self, index: usize) -> DbResult<String> {
        self.columns
            .get(index)
            .map(|(_, oracle_type)| oracle_type.to_string())
            .ok_or_else(|| DbError::internal(format!("no column at index {index}")))
    }
}

impl RowCursor for OracleCursor<'_> {
    fn next_row(&mut self) -> DbResult<Option<Vec<DbValue>>> {
        match self.rows.next() {
            None => Ok(None),
            Some(Err(e)) => Err(classify(&e, DbError::execution)),
            Some(Ok(row)) => row
                .sql_values()
                .iter()
                .map(convert_value)
                .collect::<DbResult<Vec<_>>>()
                .map(Some),
        }
    }
}

/// Translate one Oracle cell into a driver-neutral value.
fn convert_value(value: &SqlValue) -> DbResult<DbValue> {
    let fail = |e: oracle::Error| classify(&e, DbError::execution);

    if value.is_null().map_err(fail)? {
        return Ok(DbValue::Null);
    }

    let oracle_type = value.oracle_type().map_err(fail)?.clone();
    let converted = match oracle_type {
        OracleType::Varchar2(..)
        | OracleType::NVarchar2(..)
        | OracleType::Char(..)
        | OracleType::NChar(..)
        | OracleType::Long
        | OracleType::CLOB
        | OracleType::NCLOB
        | OracleType::Rowid => DbValue::Text(value.get::<String>().map_err(fail)?),
        OracleType::Number(precision, scale)
            if scale == 0 && precision > 0 && precision <= MAX_INT_PRECISION =>
        {
            DbValue::Int(value.get::<i64>().map_err(fail)?)
        }
        OracleType::Number(..) | OracleType::Float(..) => {
            DbValue::Decimal(value.get::<String>().map_err(fail)?)
        }
        OracleType::Int64 => DbValue::Int(value.get::<i64>().map_err(fail)?),
        OracleType::UInt64 => DbValue::UInt(value.get::<u64>().map_err(fail)?),
        OracleType::BinaryFloat | OracleType::BinaryDouble => {
            DbValue::Float(value.get::<f64>().map_err(fail)?)
        }
        OracleType::Boolean => DbValue::Bool(value.get::<bool>().map_err(fail)?),
        OracleType::Date | OracleType::Timestamp(..) => {
            DbValue::Timestamp(value.get::<NaiveDateTime>().map_err(fail)?)
        }
        OracleType::TimestampTZ(..) | OracleType::TimestampLTZ(..) => {
            DbValue::TimestampTz(value.get::<DateTime<FixedOffset>>().map_err(fail)?)
        }
        OracleType::Raw(..) | OracleType::LongRaw | OracleType::BLOB => {
            DbValue::Bytes(value.get::<Vec<u8>>().map_err(fail)?)
        }
        OracleType::IntervalDS(..) => {
            DbValue::Formatted(value.get::<IntervalDS>().map_err(fail)?.to_string())
        }
        OracleType::IntervalYM(..) => {
            DbValue::Formatted(value.get::<IntervalYM>().map_err(fail)?.to_string())
        }
        _ => DbValue::Formatted(value.get::<String>().map_err(fail)?),
    };
    Ok(converted)
}

// =============================================================================
// Errors
// =============================================================================

/// Reduce a driver error to its root cause, recognizing a missing client library.
fn classify(err: &oracle::Error, wrap: fn(String) -> DbError) -> DbError {
    let message = root_cause_message(err);
    if message.contains(CLIENT_LIBRARY_MISSING) {
        DbError::driver_unavailable(message)
    } else {
        wrap(message)
    }
}

fn join_error(err: tokio::task::JoinError) -> DbError {
    DbError::internal(format!("Oracle worker task failed: {err}"))
}
