//! SQLite execution backend built on `tokio-rusqlite`.
//!
//! Parameters are always bound through `rusqlite::params_from_iter`; SQL text
//! produced by the resolver never contains a value. `get` reports rows as
//! [`Rows::Many`], even for single-row statements.

use crate::backend::{Backend, BatchBackend, Rows};
use crate::error::OrmResult;
use crate::resolve::Statement;
use crate::value::{Record, Value};
use rusqlite::types::{ToSqlOutput, Type, ValueRef};
use rusqlite::{InterruptHandle, ToSql, params_from_iter};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_rusqlite::Connection;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

fn read_value(idx: usize, value: ValueRef<'_>) -> rusqlite::Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(v) => Ok(Value::Integer(v)),
        ValueRef::Real(v) => Ok(Value::Real(v)),
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map(Value::Text)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            }),
        ValueRef::Blob(_) => Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Blob,
            "BLOB columns are not supported".into(),
        )),
    }
}

/// Step through every row of a prepared statement, keyed by column name.
fn read_rows(
    stmt: &mut rusqlite::Statement<'_>,
    params: &[Value],
) -> rusqlite::Result<Vec<Record>> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            record.insert(name.clone(), read_value(idx, row.get_ref(idx)?)?);
        }
        records.push(record);
    }
    Ok(records)
}

/// Progress of one backend call, shared with the closure it queued on the
/// connection thread.
#[derive(Debug, Default)]
struct CallState {
    cancelled: AtomicBool,
    running: AtomicBool,
}

impl CallState {
    /// Fail with `SQLITE_INTERRUPT` once the caller has gone away.
    fn check(&self) -> rusqlite::Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
                Some("call cancelled by caller".to_string()),
            ));
        }
        Ok(())
    }
}

/// Cancels a queued call when the future awaiting it is dropped first,
/// interrupting the statement it is executing, if any.
struct CancelOnDrop {
    state: Arc<CallState>,
    interrupt: Arc<InterruptHandle>,
    armed: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.state.cancelled.store(true, Ordering::SeqCst);
        if self.state.running.load(Ordering::SeqCst) {
            self.interrupt.interrupt();
        }
        tracing::debug!(target: "fragql.sqlite", "cancelled in-flight call");
    }
}

/// SQLite-backed [`Backend`].
///
/// Dropping a pending `get`, `run` or `batch` future (for instance when an
/// operator timeout fires) cancels the call: a running statement is
/// interrupted and an open batch transaction rolls back. Only a commit that
/// has already started can still complete.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Connection,
    interrupt: Arc<InterruptHandle>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Wrap an already opened connection as is.
    pub async fn new(conn: Connection) -> OrmResult<Self> {
        let interrupt = conn.call(|conn| Ok(conn.get_interrupt_handle())).await?;
        Ok(Self {
            conn,
            interrupt: Arc::new(interrupt),
        })
    }

    /// Open (or create) a database file with foreign key enforcement on.
    pub async fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).await?;
        tracing::debug!(target: "fragql.sqlite", path = %path.display(), "opened database");
        Self::with_foreign_keys(conn).await
    }

    /// Open a private in-memory database with foreign key enforcement on.
    pub async fn open_in_memory() -> OrmResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_foreign_keys(conn).await
    }

    async fn with_foreign_keys(conn: Connection) -> OrmResult<Self> {
        let backend = Self::new(conn).await?;
        backend
            .call(|conn, _| conn.pragma_update(None, "foreign_keys", true))
            .await?;
        Ok(backend)
    }

    /// Run raw, parameterless SQL (schema fixtures and the like).
    pub async fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        let sql = sql.to_string();
        self.call(move |conn, _| conn.execute_batch(&sql)).await
    }

    /// Run `f` on the connection thread, cancelling it if this future is
    /// dropped before it completes.
    async fn call<R, F>(&self, f: F) -> OrmResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut rusqlite::Connection, &CallState) -> rusqlite::Result<R> + Send + 'static,
    {
        let state = Arc::new(CallState::default());
        let mut guard = CancelOnDrop {
            state: Arc::clone(&state),
            interrupt: Arc::clone(&self.interrupt),
            armed: true,
        };
        let result = self
            .conn
            .call(move |conn| {
                state.running.store(true, Ordering::SeqCst);
                let result = state.check().and_then(|()| f(conn, &state));
                state.running.store(false, Ordering::SeqCst);
                result.map_err(wrap_err)
            })
            .await;
        guard.armed = false;
        Ok(result?)
    }
}

impl Backend for SqliteBackend {
    async fn get(&self, sql: &str, params: &[Value]) -> OrmResult<Rows> {
        let sql = sql.to_string();
        let params = params.to_vec();
        let records = self
            .call(move |conn, _| {
                let mut stmt = conn.prepare(&sql)?;
                read_rows(&mut stmt, &params)
            })
            .await?;
        Ok(Rows::Many(records))
    }

    async fn run(&self, sql: &str, params: &[Value]) -> OrmResult<()> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.call(move |conn, _| {
            let mut stmt = conn.prepare(&sql)?;
            // Drain instead of `execute` so RETURNING statements run too.
            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            while rows.next()?.is_some() {}
            Ok(())
        })
        .await
    }
}

impl BatchBackend for SqliteBackend {
    async fn batch(&self, statements: &[Statement]) -> OrmResult<Vec<Vec<Record>>> {
        let statements = statements.to_vec();
        self.call(move |conn, state| {
            // Dropping the transaction on error rolls it back.
            let tx = conn.transaction()?;
            let mut results = Vec::with_capacity(statements.len());
            for statement in &statements {
                state.check()?;
                let mut stmt = tx.prepare(&statement.sql)?;
                results.push(read_rows(&mut stmt, &statement.params)?);
            }
            state.check()?;
            tx.commit()?;
            Ok(results)
        })
        .await
    }
}
