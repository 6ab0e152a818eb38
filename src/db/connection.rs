//! Connection abstraction.
//!
//! Tool handlers never talk to a driver directly. They load [`ConnectionOptions`]
//! through an [`OptionsSource`] and open a fresh [`DbConnection`] per call through
//! a [`ConnectionFactory`]. Nothing is pooled: each invocation opens its own
//! connection and closes it before returning.

use crate::db::mapper::FetchedRows;
use crate::db::types::DbValue;
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionOptions, OptionsSource, QueryParam};
use crate::tools::sql_guard::ROW_LIMIT_BIND;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// A named bind value. The name never carries the leading `:`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedBind {
    name: String,
    value: QueryParam,
}

impl NamedBind {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &QueryParam {
        &self.value
    }
}

/// SQL text plus its named binds.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    sql: String,
    binds: Vec<NamedBind>,
}

impl BoundStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// Add a caller-supplied bind.
    ///
    /// One leading `:` is stripped. Empty names, the reserved row-limit name and a
    /// name bound twice (Oracle bind names ignore case) are rejected.
    pub fn bind(self, name: &str, value: QueryParam) -> DbResult<Self> {
        let name = name.strip_prefix(':').unwrap_or(name);
        if name.trim().is_empty() {
            return Err(DbError::validation("Parameter names must not be empty."));
        }
        if name.eq_ignore_ascii_case(ROW_LIMIT_BIND) {
            return Err(DbError::validation(format!(
                "Parameter name '{ROW_LIMIT_BIND}' is reserved."
            )));
        }
        if self.bind_value(name).is_some() {
            return Err(DbError::validation(format!(
                "Parameter '{name}' is given more than once."
            )));
        }
        Ok(self.bind_internal(name, value))
    }

    /// Add a server-owned bind without the caller-facing checks.
    pub(crate) fn bind_internal(mut self, name: &str, value: QueryParam) -> Self {
        self.binds.push(NamedBind {
            name: name.to_string(),
            value,
        });
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[NamedBind] {
        &self.binds
    }

    /// Look up a bind value by name.
    pub fn bind_value(&self, name: &str) -> Option<&QueryParam> {
        self.binds
            .iter()
            .find(|bind| bind.name.eq_ignore_ascii_case(name))
            .map(|bind| &bind.value)
    }
}

/// An open database session.
#[async_trait]
pub trait DbConnection: Send {
    /// Execute `statement` and read at most `max_rows` rows.
    async fn fetch(
        &mut self,
        statement: &BoundStatement,
        max_rows: usize,
        cancel: &CancellationToken,
    ) -> DbResult<FetchedRows>;

    /// Execute `statement` and return the first column of the first row.
    /// `DbValue::Null` when there is no row.
    async fn fetch_scalar(
        &mut self,
        statement: &BoundStatement,
        cancel: &CancellationToken,
    ) -> DbResult<DbValue>;

    async fn close(self: Box<Self>) -> DbResult<()>;
}

/// Opens connections for a driver.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open(
        &self,
        options: &ConnectionOptions,
        cancel: &CancellationToken,
    ) -> DbResult<Box<dyn DbConnection>>;

    /// Short driver name for logs.
    fn driver_name(&self) -> &'static str;
}

/// Factory used when no driver can be loaded. Every open fails with the stored reason.
#[derive(Debug, Clone)]
pub struct UnavailableFactory {
    reason: String,
}

impl UnavailableFactory {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ConnectionFactory for UnavailableFactory {
    async fn open(
        &self,
        _options: &ConnectionOptions,
        _cancel: &CancellationToken,
    ) -> DbResult<Box<dyn DbConnection>> {
        Err(DbError::driver_unavailable(self.reason.clone()))
    }

    fn driver_name(&self) -> &'static str {
        "unavailable"
    }
}

/// The factory for the compiled-in driver.
#[cfg(feature = "oracle")]
pub fn default_factory() -> DbResult<Arc<dyn ConnectionFactory>> {
    Ok(Arc::new(crate::db::oracle::OracleConnectionFactory::new()))
}

/// The factory for the compiled-in driver.
#[cfg(not(feature = "oracle"))]
pub fn default_factory() -> DbResult<Arc<dyn ConnectionFactory>> {
    Err(DbError::driver_unavailable(
        "this build does not include the `oracle` feature",
    ))
}

/// Everything a tool handler needs to reach the database.
#[derive(Clone)]
pub struct ConnectionProvider {
    options: Arc<dyn OptionsSource>,
    factory: Arc<dyn ConnectionFactory>,
}

impl ConnectionProvider {
    pub fn new(options: Arc<dyn OptionsSource>, factory: Arc<dyn ConnectionFactory>) -> Self {
        Self { options, factory }
    }

    /// Provider for the compiled-in driver, reading options from the environment.
    ///
    /// Falls back to [`UnavailableFactory`] so the server still starts and every
    /// tool reports why the driver is missing.
    pub fn from_env() -> Self {
        let factory = default_factory().unwrap_or_else(|e| {
            warn!(error = %e, "Oracle driver unavailable, tools will report errors");
            Arc::new(UnavailableFactory::new(e.to_string()))
        });
        Self::new(Arc::new(crate::models::EnvOptionsSource), factory)
    }

    pub fn load_options(&self) -> DbResult<ConnectionOptions> {
        self.options.load()
    }

    pub async fn open(
        &self,
        options: &ConnectionOptions,
        cancel: &CancellationToken,
    ) -> DbResult<Box<dyn DbConnection>> {
        if cancel.is_cancelled() {
            return Err(DbError::cancelled("connection open"));
        }
        self.factory.open(options, cancel).await
    }

    pub fn driver_name(&self) -> &'static str {
        self.factory.driver_name()
    }
}

impl std::fmt::Debug for ConnectionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("driver", &self.driver_name())
            .finish_non_exhaustive()
    }
}

/// Close a connection, logging rather than returning a close failure.
pub async fn release(connection: Box<dyn DbConnection>) {
    if let Err(e) = connection.close().await {
        warn!(error = %e, "Failed to close connection");
    }
}
