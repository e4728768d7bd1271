//! Stored shapes of users, sessions and keys.

use fragql::{FromRow, OrmResult, Record, RecordExt, Values};

/// A user row: the `id` column plus every other column as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub attributes: Record,
}

impl FromRow for UserRecord {
    fn from_row(row: &Record) -> OrmResult<Self> {
        let id = row.try_get_column("id")?;
        let mut attributes = row.clone();
        attributes.shift_remove("id");
        Ok(Self { id, attributes })
    }
}

impl UserRecord {
    /// Column values for an insert: `id` first, then the attributes.
    pub(crate) fn insert_values(user_id: &str, attributes: Values) -> Values {
        let mut values = Values::new().set("id", user_id);
        values.extend(attributes.into_iter().filter(|(column, _)| column != "id"));
        values
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub active_expires: i64,
    pub idle_expires: i64,
}

impl FromRow for SessionRecord {
    fn from_row(row: &Record) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            user_id: row.try_get_column("user_id")?,
            active_expires: row.try_get_column("active_expires")?,
            idle_expires: row.try_get_column("idle_expires")?,
        })
    }
}

impl SessionRecord {
    pub fn to_values(&self) -> Values {
        Values::new()
            .set("id", &self.id)
            .set("user_id", &self.user_id)
            .set("active_expires", self.active_expires)
            .set("idle_expires", self.idle_expires)
    }
}

/// A credential row. `primary_key` is stored as integer 0/1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub id: String,
    pub user_id: String,
    pub primary_key: bool,
    pub hashed_password: Option<String>,
    pub expires: Option<i64>,
}

impl FromRow for KeyRecord {
    fn from_row(row: &Record) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            user_id: row.try_get_column("user_id")?,
            primary_key: row.try_get_column("primary_key")?,
            hashed_password: row.try_get_column("hashed_password")?,
            expires: row.try_get_column("expires")?,
        })
    }
}

impl KeyRecord {
    pub fn to_values(&self) -> Values {
        Values::new()
            .set("id", &self.id)
            .set("user_id", &self.user_id)
            .set("primary_key", self.primary_key)
            .set("hashed_password", self.hashed_password.as_deref())
            .set("expires", self.expires)
    }
}
