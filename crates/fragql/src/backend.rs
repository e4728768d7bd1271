//! Execution backend contract.
//!
//! A backend receives finished SQL text plus positional parameters and is
//! responsible for binding them safely (parameterized execution, never string
//! interpolation). It reports failures as
//! [`OrmError::Backend`](crate::OrmError::Backend) without interpreting them.

use crate::error::OrmResult;
use crate::resolve::Statement;
use crate::value::{Record, Value};
use std::future::Future;
use std::sync::Arc;

/// What a backend hands back from its row-returning path.
///
/// Not every driver returns a sequence for single-row statements, so the
/// three shapes are kept apart here and normalized by the helpers below.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Rows {
    /// Nothing came back.
    #[default]
    None,
    /// A bare record, not wrapped in a sequence.
    One(Record),
    /// An ordered sequence of records (possibly empty).
    Many(Vec<Record>),
}

impl Rows {
    /// The first record, if any. Extra records are dropped.
    pub fn into_first(self) -> Option<Record> {
        match self {
            Rows::None => None,
            Rows::One(record) => Some(record),
            Rows::Many(records) => records.into_iter().next(),
        }
    }

    /// All records in order; a bare record becomes a one-element vec.
    pub fn into_vec(self) -> Vec<Record> {
        match self {
            Rows::None => Vec::new(),
            Rows::One(record) => vec![record],
            Rows::Many(records) => records,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Rows::None => 0,
            Rows::One(_) => 1,
            Rows::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Record>> for Rows {
    fn from(records: Vec<Record>) -> Self {
        Rows::Many(records)
    }
}

impl From<Option<Record>> for Rows {
    fn from(record: Option<Record>) -> Self {
        record.map_or(Rows::None, Rows::One)
    }
}

/// A backend able to execute resolved statements.
pub trait Backend: Send + Sync {
    /// Execute a statement and return whatever rows it produced.
    fn get(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<Rows>> + Send;

    /// Execute a statement for its side effects only.
    fn run(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<()>> + Send;
}

/// A backend with native all-or-nothing multi-statement execution.
pub trait BatchBackend: Backend {
    /// Execute every statement atomically, returning each statement's rows
    /// in input order. If any statement fails, none take effect.
    fn batch(
        &self,
        statements: &[Statement],
    ) -> impl Future<Output = OrmResult<Vec<Vec<Record>>>> + Send;
}

impl<B: Backend> Backend for &B {
    fn get(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<Rows>> + Send {
        (**self).get(sql, params)
    }

    fn run(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<()>> + Send {
        (**self).run(sql, params)
    }
}

impl<B: Backend> Backend for Arc<B> {
    fn get(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<Rows>> + Send {
        (**self).get(sql, params)
    }

    fn run(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<()>> + Send {
        (**self).run(sql, params)
    }
}

impl<B: BatchBackend> BatchBackend for &B {
    fn batch(
        &self,
        statements: &[Statement],
    ) -> impl Future<Output = OrmResult<Vec<Vec<Record>>>> + Send {
        (**self).batch(statements)
    }
}

impl<B: BatchBackend> BatchBackend for Arc<B> {
    fn batch(
        &self,
        statements: &[Statement],
    ) -> impl Future<Output = OrmResult<Vec<Vec<Record>>>> + Send {
        (**self).batch(statements)
    }
}
