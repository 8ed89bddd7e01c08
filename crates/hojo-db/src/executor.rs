//! The session trait and the process-wide session source.
//!
//! [`Session`] is the narrow async interface the ORM needs from a relational
//! engine: run a statement, run a query, and bracket work in a transaction.
//! Backends in `hojo-db-backends` implement it.
//!
//! Managers that are not given a session explicitly ask the installed
//! [`SessionSource`] for one. The source is installed once at start-up with
//! [`install_session_source`] and only reset by test harnesses.

use std::sync::{Arc, PoisonError, RwLock};

use hojo_core::{HojoError, HojoResult};

use crate::query::compiler::{DatabaseBackendType, Row};
use crate::value::Value;

/// Minimal async database session.
///
/// This is the bridge between the ORM layer (`hojo-db`) and the concrete
/// database backends (`hojo-db-backends`). QuerySets hold an
/// `Arc<dyn Session>` and never see a driver type.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    /// Returns the backend type for SQL compilation.
    fn backend_type(&self) -> DatabaseBackendType;

    /// Runs a SQL statement that does not return rows.
    /// Returns the number of rows affected.
    async fn execute(&self, sql: &str, params: &[Value]) -> HojoResult<u64>;

    /// Runs a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> HojoResult<Vec<Row>>;

    /// Opens a transaction.
    async fn begin(&self) -> HojoResult<()>;

    /// Commits the open transaction.
    async fn commit(&self) -> HojoResult<()>;

    /// Rolls back the open transaction.
    async fn rollback(&self) -> HojoResult<()>;

    /// Runs one statement as its own unit of work: `BEGIN`, the statement,
    /// `COMMIT`. Any failure rolls back and is returned.
    ///
    /// Backends whose connection can be used by several tasks should
    /// override this to hold the connection for the whole unit.
    async fn execute_in_unit(&self, sql: &str, params: &[Value]) -> HojoResult<u64> {
        self.begin().await?;
        match self.execute(sql, params).await {
            Ok(affected) => {
                self.commit().await?;
                Ok(affected)
            }
            Err(err) => {
                tracing::debug!(error = %err, "rolling back unit of work");
                self.rollback().await?;
                Err(err)
            }
        }
    }
}

/// Hands out sessions to managers that were not given one explicitly.
pub trait SessionSource: Send + Sync {
    /// Returns the session for the current connection, creating it on first
    /// use.
    fn session(&self) -> HojoResult<Arc<dyn Session>>;
}

static SESSION_SOURCE: RwLock<Option<Arc<dyn SessionSource>>> = RwLock::new(None);

/// Installs the process-wide session source, replacing any previous one.
pub fn install_session_source(source: Arc<dyn SessionSource>) {
    *SESSION_SOURCE.write().unwrap_or_else(PoisonError::into_inner) = Some(source);
}

/// Removes the process-wide session source.
pub fn reset_session_source() {
    *SESSION_SOURCE.write().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Returns a session from the installed source.
///
/// Fails with [`HojoError::ConnectionCredential`] when no source has been
/// installed.
pub fn default_session() -> HojoResult<Arc<dyn Session>> {
    let source = SESSION_SOURCE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or_else(|| {
            HojoError::ConnectionCredential("no default connection has been installed".to_string())
        })?;
    source.session()
}
