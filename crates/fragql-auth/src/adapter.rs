//! User / session / key persistence expressed as fragment lists.

use crate::config::{AuthConfig, TableNames};
use crate::error::{AuthError, AuthResult, Violation, translate};
use crate::records::{KeyRecord, SessionRecord, UserRecord};
use fragql::{BatchBackend, FromRow, Operator, Record, RecordExt, Values};

const SESSION_ID: &str = "_session_id";
const SESSION_USER_ID: &str = "_session_user_id";
const SESSION_ACTIVE_EXPIRES: &str = "_session_active_expires";
const SESSION_IDLE_EXPIRES: &str = "_session_idle_expires";

const SESSION_INSERT_VIOLATIONS: [Violation; 2] =
    [Violation::InvalidUserId, Violation::DuplicateSessionId];
const KEY_INSERT_VIOLATIONS: [Violation; 2] = [Violation::InvalidUserId, Violation::DuplicateKeyId];

/// Auth persistence over any backend that supports atomic batches.
#[derive(Debug, Clone)]
pub struct AuthAdapter<B> {
    operator: Operator<B>,
    tables: TableNames,
}

impl<B: BatchBackend> AuthAdapter<B> {
    pub fn new(operator: Operator<B>) -> Self {
        Self::with_tables(operator, TableNames::default())
    }

    pub fn with_tables(operator: Operator<B>, tables: TableNames) -> Self {
        Self { operator, tables }
    }

    /// Build an adapter with the table names from a loaded [`AuthConfig`].
    pub fn from_config(operator: Operator<B>, config: AuthConfig) -> Self {
        Self::with_tables(operator, config.tables)
    }

    pub fn operator(&self) -> &Operator<B> {
        &self.operator
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    fn translate(&self, err: fragql::OrmError, expected: &[Violation]) -> AuthError {
        translate(err, &self.tables, expected)
    }

    // ---- users ----

    pub async fn get_user(&self, user_id: &str) -> AuthResult<Option<UserRecord>> {
        let user = self
            .operator
            .get(|ctx| {
                vec![
                    ctx.select_from(&self.tables.user, ["*"]),
                    ctx.eq("id", user_id).into(),
                ]
            })
            .await?;
        Ok(user)
    }

    /// Insert a user, and its first key when given, returning the stored user.
    ///
    /// With a key, both inserts run as one atomic batch.
    pub async fn set_user(
        &self,
        user_id: &str,
        attributes: Values,
        key: Option<&KeyRecord>,
    ) -> AuthResult<UserRecord> {
        let user_values = UserRecord::insert_values(user_id, attributes);
        let Some(key) = key else {
            let user: Option<UserRecord> = self
                .operator
                .get(|ctx| {
                    vec![
                        ctx.insert_into(&self.tables.user, user_values),
                        ctx.returning(["*"]),
                    ]
                })
                .await?;
            return user.ok_or_else(|| AuthError::unexpected("insert returned no user row"));
        };

        let insert_user = self.operator.write(|ctx| {
            vec![
                ctx.insert_into(&self.tables.user, user_values),
                ctx.returning(["*"]),
            ]
        })?;
        let insert_key = self
            .operator
            .write(|ctx| vec![ctx.insert_into(&self.tables.key, key.to_values())])?;
        let results = self
            .operator
            .batch(&[insert_user, insert_key])
            .await
            .map_err(|e| self.translate(e, &[Violation::DuplicateKeyId]))?;
        let row = results
            .into_iter()
            .next()
            .and_then(|rows| rows.into_iter().next())
            .ok_or_else(|| AuthError::unexpected("insert returned no user row"))?;
        Ok(UserRecord::from_row(&row)?)
    }

    pub async fn delete_user(&self, user_id: &str) -> AuthResult<()> {
        self.operator
            .run(|ctx| {
                vec![
                    ctx.delete_from(&self.tables.user),
                    ctx.eq("id", user_id).into(),
                ]
            })
            .await?;
        Ok(())
    }

    /// Update user columns. Empty `attributes` issue no statement.
    pub async fn update_user_attributes(
        &self,
        user_id: &str,
        attributes: Values,
    ) -> AuthResult<()> {
        if attributes.is_empty() {
            return Ok(());
        }
        self.operator
            .run(|ctx| {
                vec![
                    ctx.update(&self.tables.user, attributes),
                    ctx.eq("id", user_id).into(),
                ]
            })
            .await?;
        Ok(())
    }

    // ---- sessions ----

    /// Look up a session and its user in one joined query.
    pub async fn get_session_and_user_by_session_id(
        &self,
        session_id: &str,
    ) -> AuthResult<Option<(SessionRecord, UserRecord)>> {
        let session_table = &self.tables.session;
        let user_table = &self.tables.user;
        let row: Option<Record> = self
            .operator
            .get(|ctx| {
                vec![
                    ctx.select_from(
                        session_table,
                        [
                            format!("{user_table}.*"),
                            format!("{session_table}.id as {SESSION_ID}"),
                            format!("{session_table}.active_expires as {SESSION_ACTIVE_EXPIRES}"),
                            format!("{session_table}.idle_expires as {SESSION_IDLE_EXPIRES}"),
                            format!("{session_table}.user_id as {SESSION_USER_ID}"),
                        ],
                    ),
                    ctx.inner_join(
                        user_table,
                        format!("{user_table}.id"),
                        format!("{session_table}.user_id"),
                    ),
                    ctx.eq(format!("{session_table}.id"), session_id).into(),
                ]
            })
            .await?;
        let Some(mut row) = row else {
            return Ok(None);
        };

        let session = SessionRecord {
            id: row.try_get_column(SESSION_ID)?,
            user_id: row.try_get_column(SESSION_USER_ID)?,
            active_expires: row.try_get_column(SESSION_ACTIVE_EXPIRES)?,
            idle_expires: row.try_get_column(SESSION_IDLE_EXPIRES)?,
        };
        for column in [
            SESSION_ID,
            SESSION_USER_ID,
            SESSION_ACTIVE_EXPIRES,
            SESSION_IDLE_EXPIRES,
        ] {
            row.shift_remove(column);
        }
        Ok(Some((session, UserRecord::from_row(&row)?)))
    }

    pub async fn get_session(&self, session_id: &str) -> AuthResult<Option<SessionRecord>> {
        let session = self
            .operator
            .get(|ctx| {
                vec![
                    ctx.select_from(&self.tables.session, ["*"]),
                    ctx.eq("id", session_id).into(),
                ]
            })
            .await?;
        Ok(session)
    }

    pub async fn get_sessions_by_user_id(&self, user_id: &str) -> AuthResult<Vec<SessionRecord>> {
        let sessions = self
            .operator
            .get_all(|ctx| {
                vec![
                    ctx.select_from(&self.tables.session, ["*"]),
                    ctx.eq("user_id", user_id).into(),
                ]
            })
            .await?;
        Ok(sessions)
    }

    pub async fn set_session(&self, session: &SessionRecord) -> AuthResult<()> {
        self.operator
            .run(|ctx| vec![ctx.insert_into(&self.tables.session, session.to_values())])
            .await
            .map_err(|e| self.translate(e, &SESSION_INSERT_VIOLATIONS))
    }

    pub async fn delete_session(&self, session_id: &str) -> AuthResult<()> {
        self.operator
            .run(|ctx| {
                vec![
                    ctx.delete_from(&self.tables.session),
                    ctx.eq("id", session_id).into(),
                ]
            })
            .await?;
        Ok(())
    }

    pub async fn delete_sessions_by_user_id(&self, user_id: &str) -> AuthResult<()> {
        self.operator
            .run(|ctx| {
                vec![
                    ctx.delete_from(&self.tables.session),
                    ctx.eq("user_id", user_id).into(),
                ]
            })
            .await?;
        Ok(())
    }

    // ---- keys ----

    pub async fn set_key(&self, key: &KeyRecord) -> AuthResult<()> {
        self.operator
            .run(|ctx| vec![ctx.insert_into(&self.tables.key, key.to_values())])
            .await
            .map_err(|e| self.translate(e, &KEY_INSERT_VIOLATIONS))
    }

    pub async fn get_key(&self, key_id: &str) -> AuthResult<Option<KeyRecord>> {
        let key = self
            .operator
            .get(|ctx| {
                vec![
                    ctx.select_from(&self.tables.key, ["*"]),
                    ctx.eq("id", key_id).into(),
                ]
            })
            .await?;
        Ok(key)
    }

    pub async fn get_keys_by_user_id(&self, user_id: &str) -> AuthResult<Vec<KeyRecord>> {
        let keys = self
            .operator
            .get_all(|ctx| {
                vec![
                    ctx.select_from(&self.tables.key, ["*"]),
                    ctx.eq("user_id", user_id).into(),
                ]
            })
            .await?;
        Ok(keys)
    }

    pub async fn update_key_password(
        &self,
        key_id: &str,
        hashed_password: Option<&str>,
    ) -> AuthResult<()> {
        self.operator
            .run(|ctx| {
                vec![
                    ctx.update(
                        &self.tables.key,
                        Values::new().set("hashed_password", hashed_password),
                    ),
                    ctx.eq("id", key_id).into(),
                ]
            })
            .await?;
        Ok(())
    }

    pub async fn delete_keys_by_user_id(&self, user_id: &str) -> AuthResult<()> {
        self.operator
            .run(|ctx| {
                vec![
                    ctx.delete_from(&self.tables.key),
                    ctx.eq("user_id", user_id).into(),
                ]
            })
            .await?;
        Ok(())
    }

    /// Delete a key unless it is the user's primary key.
    pub async fn delete_non_primary_key(&self, key_id: &str) -> AuthResult<()> {
        self.operator
            .run(|ctx| {
                vec![
                    ctx.delete_from(&self.tables.key),
                    ctx.and([ctx.eq("id", key_id), ctx.eq("primary_key", false)]),
                ]
            })
            .await?;
        Ok(())
    }
}
