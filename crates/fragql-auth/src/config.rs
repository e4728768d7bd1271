use crate::error::{AuthError, AuthResult};
use serde::Deserialize;
use std::path::Path;

/// Table names used by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub user: String,
    pub session: String,
    pub key: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            user: "auth_user".to_string(),
            session: "auth_session".to_string(),
            key: "auth_key".to_string(),
        }
    }
}

/// Adapter configuration file.
///
/// ```toml
/// [tables]
/// user = "test_user"
/// session = "user_session"
/// key = "user_key"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tables: TableNames,
}

impl AuthConfig {
    pub fn from_toml_str(raw: &str) -> AuthResult<Self> {
        let config: AuthConfig = toml::from_str(raw)
            .map_err(|e| AuthError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AuthError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> AuthResult<()> {
        let tables = &self.tables;
        for (field, name) in [
            ("user", &tables.user),
            ("session", &tables.session),
            ("key", &tables.key),
        ] {
            if name.trim().is_empty() {
                return Err(AuthError::Config(format!("tables.{field} must not be empty")));
            }
        }
        Ok(())
    }
}
