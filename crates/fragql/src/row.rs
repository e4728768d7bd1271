//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use crate::value::{Record, Value};

/// Trait for converting a single column value into a Rust type.
pub trait FromValue: Sized {
    /// Convert a column value into Self. `column` is only used for errors.
    fn from_value(column: &str, value: &Value) -> OrmResult<Self>;
}

fn mismatch(column: &str, expected: &str, value: &Value) -> OrmError {
    OrmError::decode(
        column,
        format!("expected {expected}, got {}", value.type_name()),
    )
}

impl FromValue for Value {
    fn from_value(_column: &str, value: &Value) -> OrmResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(column: &str, value: &Value) -> OrmResult<Self> {
        value
            .as_i64()
            .ok_or_else(|| mismatch(column, "integer", value))
    }
}

impl FromValue for i32 {
    fn from_value(column: &str, value: &Value) -> OrmResult<Self> {
        let v = i64::from_value(column, value)?;
        i32::try_from(v)
            .map_err(|_| OrmError::decode(column, format!("{v} is out of range for i32")))
    }
}

impl FromValue for f64 {
    fn from_value(column: &str, value: &Value) -> OrmResult<Self> {
        value
            .as_f64()
            .ok_or_else(|| mismatch(column, "real", value))
    }
}

/// SQLite has no boolean type; booleans are stored as integer 0/1.
impl FromValue for bool {
    fn from_value(column: &str, value: &Value) -> OrmResult<Self> {
        match value {
            Value::Integer(v) => Ok(*v != 0),
            Value::Real(v) => Ok(*v != 0.0),
            other => Err(mismatch(column, "integer", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(column: &str, value: &Value) -> OrmResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(column, "text", value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(column: &str, value: &Value) -> OrmResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(column, value).map(Some)
        }
    }
}

/// Trait for converting a result record into a Rust struct.
///
/// # Example
///
/// ```ignore
/// use fragql::{FromRow, OrmResult, Record, RecordExt};
///
/// struct Session {
///     id: String,
///     active_expires: i64,
/// }
///
/// impl FromRow for Session {
///     fn from_row(row: &Record) -> OrmResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             active_expires: row.try_get_column("active_expires")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a result record into Self
    fn from_row(row: &Record) -> OrmResult<Self>;
}

impl FromRow for Record {
    fn from_row(row: &Record) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

/// Extension trait for Record to provide typed access
pub trait RecordExt {
    /// Try to get a column value, returning OrmError::Decode on failure.
    ///
    /// A missing column decodes like `NULL`, so `Option<T>` columns may be absent.
    fn try_get_column<T: FromValue>(&self, column: &str) -> OrmResult<T>;
}

impl RecordExt for Record {
    fn try_get_column<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        T::from_value(column, self.get(column).unwrap_or(&Value::Null))
            .map_err(|e| match e {
                OrmError::Decode { .. } if !self.contains_key(column) => {
                    OrmError::decode(column, "column not found")
                }
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        let mut row = Record::new();
        row.insert("id".into(), Value::Text("k1".into()));
        row.insert("primary_key".into(), Value::Integer(1));
        row.insert("expires".into(), Value::Null);
        row
    }

    #[test]
    fn typed_access() {
        let row = record();
        assert_eq!(row.try_get_column::<String>("id").unwrap(), "k1");
        assert!(row.try_get_column::<bool>("primary_key").unwrap());
        assert_eq!(row.try_get_column::<Option<i64>>("expires").unwrap(), None);
        assert_eq!(row.try_get_column::<Option<i64>>("missing").unwrap(), None);
    }

    #[test]
    fn narrow_integers_are_range_checked() {
        let mut row = record();
        row.insert("big".into(), Value::Integer(i64::from(i32::MAX) + 1));
        assert_eq!(row.try_get_column::<i32>("primary_key").unwrap(), 1);
        let err = row.try_get_column::<i32>("big").unwrap_err();
        assert!(matches!(err, OrmError::Decode { column, .. } if column == "big"));
    }

    #[test]
    fn mismatches_are_decode_errors() {
        let row = record();
        match row.try_get_column::<i64>("id").unwrap_err() {
            OrmError::Decode { column, message } => {
                assert_eq!(column, "id");
                assert_eq!(message, "expected integer, got text");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match row.try_get_column::<String>("missing").unwrap_err() {
            OrmError::Decode { message, .. } => assert_eq!(message, "column not found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
