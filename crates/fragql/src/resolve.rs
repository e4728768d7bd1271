//! Compiles an ordered fragment list into one parameterized statement.
//!
//! Resolution is a pure left fold: every fragment becomes a
//! [`ResolvedFragment`] (its SQL text plus the parameters of that text only),
//! the texts are joined with a single space and the parameters concatenated,
//! both in input order. Nothing is reordered, so fragments must already be in
//! valid SQL clause order (`SELECT`, then `INNER JOIN`, then `WHERE`).

use crate::error::{OrmError, OrmResult};
use crate::fragment::{Fragment, Where};
use crate::value::{Value, Values};

/// SQL text of a single fragment and the parameters bound by it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl ResolvedFragment {
    fn text(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }
}

/// A compiled statement, ready for a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Number of `?` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Quote a table or column identifier with backticks.
///
/// `*` is returned unchanged. Embedded backticks are doubled so the name is
/// always wrapped exactly once.
pub fn escape_name(name: &str) -> String {
    if name == "*" {
        return name.to_string();
    }
    format!("`{}`", name.replace('`', "``"))
}

/// Resolve a fragment list into a single statement.
pub fn resolve(fragments: &[Fragment]) -> OrmResult<Statement> {
    let mut chunks = Vec::with_capacity(fragments.len());
    let mut params = Vec::new();
    for fragment in fragments {
        let resolved = resolve_fragment(fragment)?;
        chunks.push(resolved.sql);
        params.extend(resolved.params);
    }
    Ok(Statement {
        sql: chunks.join(" "),
        params,
    })
}

/// Resolve one fragment into its SQL text and parameters.
pub fn resolve_fragment(fragment: &Fragment) -> OrmResult<ResolvedFragment> {
    match fragment {
        Fragment::Select { table, columns } => {
            let columns = column_list("SELECT", columns)?;
            Ok(ResolvedFragment::text(format!(
                "SELECT {columns} FROM {}",
                escape_name(table)
            )))
        }
        Fragment::InsertInto { table, values } => {
            let (columns, params) = split_values("INSERT_INTO", values)?;
            let escaped: Vec<String> = columns.iter().map(|c| escape_name(c)).collect();
            let placeholders = vec!["?"; params.len()];
            Ok(ResolvedFragment {
                sql: format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    escape_name(table),
                    escaped.join(","),
                    placeholders.join(",")
                ),
                params,
            })
        }
        Fragment::Update { table, values } => {
            let (columns, params) = split_values("UPDATE", values)?;
            let assignments: Vec<String> = columns
                .iter()
                .map(|c| format!("{} = ?", escape_name(c)))
                .collect();
            Ok(ResolvedFragment {
                sql: format!("UPDATE {} SET {}", escape_name(table), assignments.join(",")),
                params,
            })
        }
        Fragment::DeleteFrom { table } => Ok(ResolvedFragment::text(format!(
            "DELETE FROM {}",
            escape_name(table)
        ))),
        Fragment::InnerJoin {
            target_table,
            target_column,
            column,
        } => Ok(ResolvedFragment::text(format!(
            "INNER JOIN {} ON {target_column} = {column}",
            escape_name(target_table)
        ))),
        Fragment::Where(condition) => {
            let (sql, value) = condition_sql(condition);
            Ok(ResolvedFragment {
                sql: format!("WHERE {sql}"),
                params: vec![value],
            })
        }
        Fragment::And { conditions } => {
            if conditions.is_empty() {
                return Err(OrmError::invalid_fragment(
                    "AND requires at least one condition",
                ));
            }
            let mut parts = Vec::with_capacity(conditions.len());
            let mut params = Vec::with_capacity(conditions.len());
            for condition in conditions {
                let (sql, value) = condition_sql(condition);
                parts.push(sql);
                params.push(value);
            }
            Ok(ResolvedFragment {
                sql: format!("WHERE {}", parts.join(" AND ")),
                params,
            })
        }
        Fragment::Returning { columns } => {
            let columns = column_list("RETURNING", columns)?;
            Ok(ResolvedFragment::text(format!("RETURNING {columns}")))
        }
        Fragment::Unknown => Err(OrmError::invalid_fragment("unrecognized fragment kind")),
    }
}

fn condition_sql(condition: &Where) -> (String, Value) {
    (
        format!("{} {} ?", condition.column, condition.comparator),
        condition.value.clone(),
    )
}

// Selection/returning targets are emitted verbatim: `*`, `t.col`, `col AS alias`.
fn column_list(kind: &str, columns: &[String]) -> OrmResult<String> {
    if columns.is_empty() {
        return Err(OrmError::invalid_fragment(format!(
            "{kind} requires at least one column"
        )));
    }
    Ok(columns.join(","))
}

// Columns and parameters come out of the same pass over `values`.
fn split_values<'a>(kind: &str, values: &'a Values) -> OrmResult<(Vec<&'a str>, Vec<Value>)> {
    if values.is_empty() {
        return Err(OrmError::invalid_fragment(format!(
            "{kind} requires at least one column value"
        )));
    }
    Ok(values.iter().map(|(c, v)| (c, v.clone())).unzip())
}
