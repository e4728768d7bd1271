//! The fragment algebra.
//!
//! A [`Fragment`] is one clause-sized piece of a statement. Builder closures
//! receive a [`Ctx`] and return the fragments in SQL clause order:
//!
//! ```ignore
//! use fragql::{Ctx, Fragment};
//!
//! let build = |ctx: Ctx| -> Vec<Fragment> {
//!     vec![
//!         ctx.select_from("auth_session", ["*"]),
//!         ctx.eq("user_id", "user-1").into(),
//!     ]
//! };
//! ```

use crate::error::{OrmError, OrmResult};
use crate::value::{Value, Values};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a filter.
///
/// Operators are written into the SQL text, so only this closed set exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<>")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
    #[serde(rename = "IS")]
    Is,
    #[serde(rename = "IS NOT")]
    IsNot,
}

impl Comparator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::NotEq => "<>",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Like => "LIKE",
            Comparator::NotLike => "NOT LIKE",
            Comparator::Is => "IS",
            Comparator::IsNot => "IS NOT",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Comparator {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_uppercase().as_str() {
            "=" => Comparator::Eq,
            "!=" => Comparator::Ne,
            "<>" => Comparator::NotEq,
            "<" => Comparator::Lt,
            "<=" => Comparator::Lte,
            ">" => Comparator::Gt,
            ">=" => Comparator::Gte,
            "LIKE" => Comparator::Like,
            "NOT LIKE" => Comparator::NotLike,
            "IS" => Comparator::Is,
            "IS NOT" => Comparator::IsNot,
            other => {
                return Err(OrmError::invalid_fragment(format!(
                    "unsupported comparator '{other}'"
                )));
            }
        };
        Ok(op)
    }
}

/// A single `column <comparator> ?` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Where {
    pub column: String,
    pub comparator: Comparator,
    pub value: Value,
}

/// One typed clause of a statement, prior to text generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Fragment {
    /// `SELECT <columns> FROM <table>`
    Select {
        table: String,
        columns: Vec<String>,
    },
    /// `INSERT INTO <table> (<columns>) VALUES (<placeholders>)`
    InsertInto { table: String, values: Values },
    /// `UPDATE <table> SET <column> = ?, ...`
    Update { table: String, values: Values },
    /// `DELETE FROM <table>`
    DeleteFrom { table: String },
    /// `INNER JOIN <target_table> ON <target_column> = <column>`
    InnerJoin {
        target_table: String,
        target_column: String,
        column: String,
    },
    /// `WHERE <column> <comparator> ?`
    Where(Where),
    /// `WHERE <c1> AND <c2> ...`; stands in place of a single `Where`.
    And {
        #[serde(alias = "whereBlocks")]
        conditions: Vec<Where>,
    },
    /// `RETURNING <columns>`
    Returning { columns: Vec<String> },
    /// Any tag this crate does not know. Only reachable through deserialization.
    #[serde(other)]
    Unknown,
}

impl Fragment {
    /// Tag name, as used in serialized fragment lists.
    pub fn kind(&self) -> &'static str {
        match self {
            Fragment::Select { .. } => "SELECT",
            Fragment::InsertInto { .. } => "INSERT_INTO",
            Fragment::Update { .. } => "UPDATE",
            Fragment::DeleteFrom { .. } => "DELETE_FROM",
            Fragment::InnerJoin { .. } => "INNER_JOIN",
            Fragment::Where(_) => "WHERE",
            Fragment::And { .. } => "AND",
            Fragment::Returning { .. } => "RETURNING",
            Fragment::Unknown => "UNKNOWN",
        }
    }

    /// Parse a JSON fragment list.
    ///
    /// Unrecognized tags parse as [`Fragment::Unknown`] and are rejected at
    /// resolution time; malformed JSON is rejected here.
    pub fn list_from_json(json: &str) -> OrmResult<Vec<Fragment>> {
        serde_json::from_str(json)
            .map_err(|e| OrmError::invalid_fragment(format!("malformed fragment list: {e}")))
    }
}

impl From<Where> for Fragment {
    fn from(w: Where) -> Self {
        Fragment::Where(w)
    }
}

/// Fragment construction context handed to builder closures.
///
/// Stateless; every constructor is a pure function of its arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ctx;

impl Ctx {
    pub fn select_from<I>(self, table: impl Into<String>, columns: I) -> Fragment
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Fragment::Select {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert_into(self, table: impl Into<String>, values: impl Into<Values>) -> Fragment {
        Fragment::InsertInto {
            table: table.into(),
            values: values.into(),
        }
    }

    pub fn update(self, table: impl Into<String>, values: impl Into<Values>) -> Fragment {
        Fragment::Update {
            table: table.into(),
            values: values.into(),
        }
    }

    pub fn delete_from(self, table: impl Into<String>) -> Fragment {
        Fragment::DeleteFrom {
            table: table.into(),
        }
    }

    /// `target_column` and `column` are emitted verbatim, so qualify them
    /// (`auth_user.id`) when both tables share column names.
    pub fn inner_join(
        self,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
        column: impl Into<String>,
    ) -> Fragment {
        Fragment::InnerJoin {
            target_table: target_table.into(),
            target_column: target_column.into(),
            column: column.into(),
        }
    }

    /// A filter condition. Convert with `.into()` to use it as a fragment,
    /// or pass several to [`Ctx::and`].
    pub fn filter(
        self,
        column: impl Into<String>,
        comparator: Comparator,
        value: impl Into<Value>,
    ) -> Where {
        Where {
            column: column.into(),
            comparator,
            value: value.into(),
        }
    }

    /// Shorthand for `filter(column, Comparator::Eq, value)`.
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Where {
        self.filter(column, Comparator::Eq, value)
    }

    pub fn where_(
        self,
        column: impl Into<String>,
        comparator: Comparator,
        value: impl Into<Value>,
    ) -> Fragment {
        self.filter(column, comparator, value).into()
    }

    pub fn and(self, conditions: impl IntoIterator<Item = Where>) -> Fragment {
        Fragment::And {
            conditions: conditions.into_iter().collect(),
        }
    }

    pub fn returning<I>(self, columns: I) -> Fragment
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Fragment::Returning {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}
