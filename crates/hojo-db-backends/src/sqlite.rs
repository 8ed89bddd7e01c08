//! SQLite session using `rusqlite`.
//!
//! This module provides the [`SqliteBackend`] which implements
//! [`Session`] with `rusqlite` wrapped in `tokio::task::spawn_blocking` for
//! async compatibility.
//!
//! SQLite has no native boolean, UUID or temporal storage. Parameters are
//! bound as integers (booleans) and text (UUIDs, dates, timestamps, JSON);
//! the row accessors in `hojo-db` accept those forms back. Timestamps are
//! written in UTC with nanosecond precision so that text comparison orders
//! them by instant; they read back with a `+00:00` offset.
//!
//! Features:
//! - WAL mode enabled for file databases
//! - In-memory database support via `:memory:` (used by the test suites)
//! - A single connection behind an async `Mutex`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hojo_core::{HojoError, HojoResult};
use hojo_db::query::compiler::DatabaseBackendType;
use hojo_db::{Row, Session, Value};
use rusqlite::types::ValueRef;
use tokio::sync::Mutex;

/// The path that opens a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// A SQLite session.
///
/// Every operation runs on the blocking pool while holding the connection
/// lock, so statements from concurrent tasks are serialized.
pub struct SqliteBackend {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by an async mutex.
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteBackend {
    /// Opens a SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    ///
    /// # Errors
    ///
    /// Returns [`HojoError::Operational`] if the database cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> HojoResult<Self> {
        let path = path.into();
        let in_memory = path.as_os_str() == MEMORY_PATH;
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| HojoError::Operational(format!("SQLite open failed: {e}")))?;

        let pragmas = if in_memory {
            "PRAGMA foreign_keys=ON;"
        } else {
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;"
        };
        conn.execute_batch(pragmas)
            .map_err(|e| HojoError::Operational(format!("Failed to set pragmas: {e}")))?;

        tracing::debug!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    pub fn memory() -> HojoResult<Self> {
        Self::open(MEMORY_PATH)
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Binds ORM values to a prepared statement.
    fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> HojoResult<()> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, i64::from(*b)),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::Float(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::Date(d) => {
                    stmt.raw_bind_parameter(idx, d.format("%Y-%m-%d").to_string())
                }
                Value::DateTime(dt) => stmt.raw_bind_parameter(idx, timestamp_text(dt)),
                Value::Uuid(u) => stmt.raw_bind_parameter(idx, u.hyphenated().to_string()),
                Value::Json(j) => stmt.raw_bind_parameter(idx, j.to_string()),
                Value::List(_) => {
                    return Err(HojoError::Database(format!(
                        "cannot bind a list as parameter {idx}"
                    )))
                }
            }
            .map_err(|e| HojoError::Database(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    /// Converts a `rusqlite::Row` to a hojo [`Row`].
    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> HojoResult<Row> {
        let mut values = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            let value = match sqlite_row.get_ref(i).map_err(map_error)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Int(v),
                ValueRef::Real(v) => Value::Float(v),
                ValueRef::Text(b) | ValueRef::Blob(b) => {
                    Value::String(String::from_utf8_lossy(b).into_owned())
                }
            };
            values.push(value);
        }
        Ok(Row::new(column_names.to_vec(), values))
    }

    fn run_execute(
        conn: &rusqlite::Connection,
        sql: &str,
        params: &[Value],
    ) -> HojoResult<u64> {
        let mut stmt = conn.prepare(sql).map_err(map_error)?;
        Self::bind_params(&mut stmt, params)?;
        let count = stmt.raw_execute().map_err(map_error)?;
        Ok(count as u64)
    }

    fn run_query(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> HojoResult<Vec<Row>> {
        let mut stmt = conn.prepare(sql).map_err(map_error)?;
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        Self::bind_params(&mut stmt, params)?;

        let mut raw_rows = stmt.raw_query();
        let mut rows = Vec::new();
        while let Some(row) = raw_rows.next().map_err(map_error)? {
            rows.push(Self::convert_row(row, &column_names)?);
        }
        Ok(rows)
    }

    /// Runs `f` against the locked connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> HojoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut rusqlite::Connection) -> HojoResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            f(&mut *conn)
        })
        .await
        .map_err(|e| HojoError::Database(format!("Task join error: {e}")))?
    }
}

/// The stored form of a timestamp: UTC, fixed-width, `Z` suffix.
fn timestamp_text(dt: &chrono::DateTime<chrono::FixedOffset>) -> String {
    dt.with_timezone(&chrono::Utc)
        .to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

/// Maps a driver error, keeping constraint violations distinguishable.
fn map_error(e: rusqlite::Error) -> HojoError {
    match e.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => HojoError::Integrity(e.to_string()),
        Some(rusqlite::ErrorCode::CannotOpen | rusqlite::ErrorCode::DatabaseBusy) => {
            HojoError::Operational(e.to_string())
        }
        _ => HojoError::Database(e.to_string()),
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").field("path", &self.path).finish()
    }
}

#[async_trait::async_trait]
impl Session for SqliteBackend {
    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::SQLite
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> HojoResult<u64> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| Self::run_execute(conn, &sql, &params))
            .await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> HojoResult<Vec<Row>> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| Self::run_query(conn, &sql, &params))
            .await
    }

    async fn begin(&self) -> HojoResult<()> {
        self.execute("BEGIN", &[]).await.map(drop)
    }

    async fn commit(&self) -> HojoResult<()> {
        self.execute("COMMIT", &[]).await.map(drop)
    }

    async fn rollback(&self) -> HojoResult<()> {
        self.execute("ROLLBACK", &[]).await.map(drop)
    }

    /// Holds the connection lock from `BEGIN` to `COMMIT` so no other task's
    /// statement lands inside the unit.
    async fn execute_in_unit(&self, sql: &str, params: &[Value]) -> HojoResult<u64> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(map_error)?;
            match Self::run_execute(&tx, &sql, &params) {
                Ok(affected) => {
                    tx.commit().map_err(map_error)?;
                    Ok(affected)
                }
                Err(err) => {
                    tracing::debug!(error = %err, "rolling back unit of work");
                    tx.rollback().map_err(map_error)?;
                    Err(err)
                }
            }
        })
        .await
    }
}
