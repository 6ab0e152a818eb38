//! Result mapping from driver cursors to [`ColumnInfo`] and [`Row`].
//!
//! Backends implement [`RowCursor`]; everything after that (column metadata,
//! row assembly, the row cap and cancellation between rows) lives here.

use crate::db::types::{DbValue, coerce_to_json};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnInfo, Row};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Column metadata of an open result set.
pub trait ColumnSource {
    fn column_count(&self) -> usize;

    fn column_name(&self, index: usize) -> String;

    /// Driver type name. Some drivers cannot describe every column; an error here
    /// is not fatal to the query.
    fn column_type_name(&self, index: usize) -> DbResult<String>;
}

/// A forward-only cursor over result rows.
pub trait RowCursor: ColumnSource {
    /// Next row as one value per column, `None` once the result set is exhausted.
    fn next_row(&mut self) -> DbResult<Option<Vec<DbValue>>>;
}

/// Columns and rows read from a cursor.
#[derive(Debug, Clone, Default)]
pub struct FetchedRows {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
}

pub fn read_columns<S: ColumnSource + ?Sized>(source: &S) -> Vec<ColumnInfo> {
    (0..source.column_count())
        .map(|index| {
            let name = source.column_name(index);
            let type_name = match source.column_type_name(index) {
                Ok(type_name) => Some(type_name),
                Err(e) => {
                    debug!(column = %name, error = %e, "Column type unavailable");
                    None
                }
            };
            ColumnInfo::new(name, type_name)
        })
        .collect()
}

/// Pair values with their column names. Missing trailing values become null.
pub fn read_row(values: Vec<DbValue>, columns: &[ColumnInfo]) -> Row {
    let mut row = Row::with_capacity(columns.len());
    let mut values = values.into_iter();
    for column in columns {
        let value = values.next().unwrap_or(DbValue::Null);
        row.insert(column.name.clone(), coerce_to_json(value));
    }
    row
}

/// Drain up to `max_rows` rows from `cursor`.
///
/// Cancellation is checked before each fetch, so a long scan stops within one row.
pub fn collect_rows<C: RowCursor + ?Sized>(
    cursor: &mut C,
    max_rows: usize,
    cancel: &CancellationToken,
) -> DbResult<FetchedRows> {
    let columns = read_columns(&*cursor);
    let mut rows = Vec::new();

    while rows.len() < max_rows {
        if cancel.is_cancelled() {
            return Err(DbError::cancelled("row iteration"));
        }
        match cursor.next_row()? {
            Some(values) => rows.push(read_row(values, &columns)),
            None => break,
        }
    }

    Ok(FetchedRows { columns, rows })
}
