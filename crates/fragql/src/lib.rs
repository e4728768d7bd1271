//! # fragql
//!
//! Composable SQL fragments, resolved into one parameterized statement and
//! executed through a pluggable backend.
//!
//! ## Features
//!
//! - **Fragment algebra**: select, insert, update, delete, inner join, filter,
//!   conjunction and returning clauses as plain values
//! - **Pure resolver**: ordered fragments become SQL text with `?` placeholders
//!   and a matching positional parameter list
//! - **Result shaping**: `get` (first row or `None`), `get_all` (every row),
//!   `run` (side effects only), `write` (resolve without executing)
//! - **Pluggable backend**: implement [`Backend`] / [`BatchBackend`]; a SQLite
//!   backend ships behind the default `sqlite` feature
//!
//! ```ignore
//! use fragql::{Operator, Record, SqliteBackend, Values};
//!
//! let operator = Operator::new(SqliteBackend::open_in_memory().await?);
//!
//! operator
//!     .run(|ctx| vec![ctx.insert_into("auth_user", Values::new().set("id", "u1"))])
//!     .await?;
//!
//! let user: Option<Record> = operator
//!     .get(|ctx| vec![ctx.select_from("auth_user", ["*"]), ctx.eq("id", "u1").into()])
//!     .await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod fragment;
pub mod operator;
pub mod resolve;
pub mod row;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use backend::{Backend, BatchBackend, Rows};
pub use config::OperatorConfig;
pub use error::{OrmError, OrmResult};
pub use fragment::{Comparator, Ctx, Fragment, Where};
pub use operator::{Operator, QueryKind};
pub use resolve::{ResolvedFragment, Statement, escape_name, resolve, resolve_fragment};
pub use row::{FromRow, FromValue, RecordExt};
pub use value::{Record, Value, Values};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
