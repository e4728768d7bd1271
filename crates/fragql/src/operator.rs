//! Resolve-execute-shape layer over a [`Backend`].
//!
//! Each call runs one builder closure, resolves its fragments, performs
//! exactly one backend call and shapes the result. Nothing is retained
//! between calls, so an `Operator` can be shared freely across tasks.
//!
//! ```ignore
//! use fragql::{Operator, Record, SqliteBackend};
//!
//! let operator = Operator::new(SqliteBackend::open_in_memory().await?);
//! let session: Option<Record> = operator
//!     .get(|ctx| vec![ctx.select_from("auth_session", ["*"]), ctx.eq("id", "s1").into()])
//!     .await?;
//! ```

use crate::backend::{Backend, BatchBackend};
use crate::config::OperatorConfig;
use crate::error::{OrmError, OrmResult};
use crate::fragment::{Ctx, Fragment};
use crate::resolve::{Statement, resolve};
use crate::row::FromRow;
use crate::value::Record;
use std::future::Future;
use tracing::Level;

/// Statement kind, detected from the leading keyword of the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl QueryKind {
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql.split_whitespace().next().unwrap_or_default();
        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryKind::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryKind::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryKind::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryKind::Delete
        } else {
            QueryKind::Other
        }
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Ties fragment building, resolution and execution together.
#[derive(Debug, Clone)]
pub struct Operator<B> {
    backend: B,
    config: OperatorConfig,
}

impl<B: Backend> Operator<B> {
    /// Create an operator with the default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, OperatorConfig::default())
    }

    pub fn with_config(backend: B, config: OperatorConfig) -> Self {
        Self { backend, config }
    }

    /// The underlying backend, for native primitives this layer does not wrap.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// Resolve a fragment list without executing it.
    pub fn write<F>(&self, build: F) -> OrmResult<Statement>
    where
        F: FnOnce(Ctx) -> Vec<Fragment>,
    {
        resolve(&build(Ctx))
    }

    /// Execute and return the first row, or `None` when nothing came back.
    pub async fn get<T, F>(&self, build: F) -> OrmResult<Option<T>>
    where
        T: FromRow,
        F: FnOnce(Ctx) -> Vec<Fragment>,
    {
        let stmt = self.write(build)?;
        self.log_statement("get", &stmt);
        let call = self.backend.get(&stmt.sql, &stmt.params);
        let rows = self.bounded("get", call).await?;
        rows.into_first().as_ref().map(T::from_row).transpose()
    }

    /// Execute and return every row in backend order (empty when none).
    pub async fn get_all<T, F>(&self, build: F) -> OrmResult<Vec<T>>
    where
        T: FromRow,
        F: FnOnce(Ctx) -> Vec<Fragment>,
    {
        let stmt = self.write(build)?;
        self.log_statement("get_all", &stmt);
        let call = self.backend.get(&stmt.sql, &stmt.params);
        let rows = self.bounded("get_all", call).await?;
        rows.into_vec().iter().map(T::from_row).collect()
    }

    /// Execute for side effects only.
    pub async fn run<F>(&self, build: F) -> OrmResult<()>
    where
        F: FnOnce(Ctx) -> Vec<Fragment>,
    {
        let stmt = self.write(build)?;
        self.log_statement("run", &stmt);
        let call = self.backend.run(&stmt.sql, &stmt.params);
        self.bounded("run", call).await
    }

    async fn bounded<R>(
        &self,
        op: &'static str,
        fut: impl Future<Output = OrmResult<R>>,
    ) -> OrmResult<R> {
        let result = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(OrmError::Timeout(limit)),
            },
            None => fut.await,
        };
        if let Err(err) = &result {
            tracing::warn!(target: "fragql.sql", op, error = %err, "statement failed");
        }
        result
    }

    fn log_statement(&self, op: &'static str, stmt: &Statement) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = match self.config.max_sql_length {
            Some(max) if stmt.sql.len() > max => {
                format!("{}...", truncate_sql_bytes(&stmt.sql, max))
            }
            _ => stmt.sql.clone(),
        };
        emit_at_level!(
            self.config.log_level,
            target: "fragql.sql",
            op,
            kind = ?QueryKind::from_sql(&stmt.sql),
            param_count = stmt.params.len(),
            sql = %sql,
        );
    }
}

impl<B: BatchBackend> Operator<B> {
    /// Execute statements produced by [`Operator::write`] as one atomic
    /// batch on the backend. Returns each statement's rows in input order.
    pub async fn batch(&self, statements: &[Statement]) -> OrmResult<Vec<Vec<Record>>> {
        for stmt in statements {
            self.log_statement("batch", stmt);
        }
        let call = self.backend.batch(statements);
        self.bounded("batch", call).await
    }
}
