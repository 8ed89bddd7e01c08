//! # hojo-db-backends
//!
//! Database sessions for hojo and the connection that picks one.
//!
//! Supported backends:
//! - `SQLite` (feature `sqlite`, on by default)
//! - `PostgreSQL` (feature `postgres`)
//!
//! ```no_run
//! # fn main() -> hojo_core::HojoResult<()> {
//! // Resolve the URI from DB_URI, the `db_uri` config key or the DB_* variables
//! // and make it the default for every `Model::objects()` manager.
//! hojo_db_backends::connection::connect(None)?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]

pub mod connection;
#[cfg(feature = "postgres")]
pub mod postgresql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use connection::{connect, install, reset, Connection, Target};
#[cfg(feature = "postgres")]
pub use postgresql::PostgresBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
