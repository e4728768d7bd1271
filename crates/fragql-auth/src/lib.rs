//! Auth persistence (users, sessions, keys) built on `fragql` fragments.
//!
//! ```ignore
//! use fragql::{Operator, SqliteBackend};
//! use fragql_auth::AuthAdapter;
//!
//! let backend = SqliteBackend::open("auth.db").await?;
//! let auth = AuthAdapter::new(Operator::new(backend));
//! let user = auth.get_user("user-1").await?;
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod records;

pub use adapter::AuthAdapter;
pub use config::{AuthConfig, TableNames};
pub use error::{AuthError, AuthResult};
pub use records::{KeyRecord, SessionRecord, UserRecord};
