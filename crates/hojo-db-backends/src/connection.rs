//! Connection URI resolution and the process-wide default connection.
//!
//! A [`Connection`] resolves its database URI once, when it is built, and
//! opens its backend lazily on the first call to
//! [`SessionSource::session`]. The URI comes from the first source that
//! provides one:
//!
//! 1. the explicit argument,
//! 2. the `DB_URI` environment variable,
//! 3. the `db_uri` configuration key,
//! 4. the legacy `DB_USER` / `DB_PASSWORD` / `DB_ENDPOINT` / `DB_PORT` /
//!    `DB_NAME` variables, assembled into a `postgresql://` URI.
//!
//! Supported schemes are `sqlite://<path>`, `sqlite::memory:`, a bare
//! `:memory:`, and (with the `postgres` feature) `postgres://` or
//! `postgresql://`, optionally with a `+driver` suffix on the scheme.

use std::sync::{Arc, Mutex, PoisonError};

use hojo_core::config::{Config, DB_URI_KEY};
use hojo_core::{HojoError, HojoResult};
use hojo_db::{install_session_source, reset_session_source, Session, SessionSource};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Environment variable holding a full database URI.
pub const DB_URI_ENV: &str = "DB_URI";

/// Port used when `DB_PORT` is not set.
pub const DEFAULT_PORT: &str = "5432";

/// Everything but the unreserved characters is escaped in the user and
/// password of an assembled URI.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The backend a URI selects, with the driver-facing address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A SQLite file path or `:memory:`.
    Sqlite(String),
    /// A PostgreSQL URI with any `+driver` suffix removed.
    Postgres(String),
}

impl Target {
    /// Parses a database URI.
    pub fn parse(uri: &str) -> HojoResult<Self> {
        if uri == ":memory:" || uri == "sqlite::memory:" {
            return Ok(Self::Sqlite(":memory:".to_string()));
        }
        let Some((scheme, rest)) = uri.split_once("://") else {
            return Err(HojoError::Configuration(format!(
                "database URI has no scheme: {}",
                redact(uri)
            )));
        };
        let base = scheme.split('+').next().unwrap_or(scheme);
        match base {
            "sqlite" if rest.is_empty() => Ok(Self::Sqlite(":memory:".to_string())),
            "sqlite" => Ok(Self::Sqlite(rest.to_string())),
            "postgres" | "postgresql" => Ok(Self::Postgres(format!("postgresql://{rest}"))),
            other => Err(HojoError::Configuration(format!(
                "unsupported database scheme '{other}'"
            ))),
        }
    }
}

/// Resolves the URI from the explicit argument, the process environment and
/// the configuration store.
pub fn resolve_uri(explicit: Option<&str>) -> HojoResult<String> {
    resolve_uri_with(
        explicit,
        |key| std::env::var(key).ok(),
        Config::get_str(DB_URI_KEY),
    )
}

/// Resolves the URI with an injectable environment lookup.
pub fn resolve_uri_with<F>(
    explicit: Option<&str>,
    env: F,
    configured: Option<String>,
) -> HojoResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());

    if let Some(uri) = explicit.filter(|s| !s.is_empty()) {
        return Ok(uri.to_string());
    }
    if let Some(uri) = non_empty(env(DB_URI_ENV)) {
        return Ok(uri);
    }
    if let Some(uri) = non_empty(configured) {
        return Ok(uri);
    }

    let user = non_empty(env("DB_USER"));
    let password = non_empty(env("DB_PASSWORD"));
    let endpoint = non_empty(env("DB_ENDPOINT"));
    let name = non_empty(env("DB_NAME"));
    let port = non_empty(env("DB_PORT")).unwrap_or_else(|| DEFAULT_PORT.to_string());
    match (user, password, endpoint, name) {
        (Some(user), Some(password), Some(endpoint), Some(name)) => Ok(format!(
            "postgresql://{}:{}@{endpoint}:{port}/{name}",
            utf8_percent_encode(&user, USERINFO),
            utf8_percent_encode(&password, USERINFO),
        )),
        _ => Err(HojoError::ConnectionCredential(
            "Invalid database credentials.".to_string(),
        )),
    }
}

/// Hides the password of a URI for logging.
pub fn redact(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return uri.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => uri.to_string(),
    }
}

/// A resolved database connection that opens its session on first use.
pub struct Connection {
    uri: String,
    target: Target,
    session: Mutex<Option<Arc<dyn Session>>>,
}

impl Connection {
    /// Resolves the URI (see the module docs) and parses it.
    ///
    /// Fails with [`HojoError::ConnectionCredential`] when no source provides
    /// a URI and with [`HojoError::Configuration`] when the scheme is not
    /// supported.
    pub fn new(uri: Option<&str>) -> HojoResult<Self> {
        Self::from_uri(resolve_uri(uri)?)
    }

    /// Builds a connection for an already resolved URI.
    pub fn from_uri(uri: impl Into<String>) -> HojoResult<Self> {
        let uri = uri.into();
        let target = Target::parse(&uri)?;
        Ok(Self {
            uri,
            target,
            session: Mutex::new(None),
        })
    }

    /// A connection to a private in-memory SQLite database.
    pub fn memory() -> Self {
        Self {
            uri: "sqlite::memory:".to_string(),
            target: Target::Sqlite(":memory:".to_string()),
            session: Mutex::new(None),
        }
    }

    /// The resolved URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The backend the URI selects.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns `true` once the backend has been opened.
    pub fn is_open(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn open(&self) -> HojoResult<Arc<dyn Session>> {
        tracing::info!(uri = %redact(&self.uri), "opening database session");
        let session: Arc<dyn Session> = match &self.target {
            #[cfg(feature = "sqlite")]
            Target::Sqlite(path) => Arc::new(crate::sqlite::SqliteBackend::open(path)?),
            #[cfg(feature = "postgres")]
            Target::Postgres(uri) => Arc::new(crate::postgresql::PostgresBackend::from_uri(uri)?),
            #[allow(unreachable_patterns)]
            other => {
                return Err(HojoError::Configuration(format!(
                    "hojo-db-backends was built without support for {other:?}"
                )))
            }
        };
        Ok(session)
    }
}

impl SessionSource for Connection {
    fn session(&self) -> HojoResult<Arc<dyn Session>> {
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }
        let session = self.open()?;
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("uri", &redact(&self.uri))
            .field("open", &self.is_open())
            .finish()
    }
}

/// Installs `connection` as the process-wide default used by managers that
/// were not bound to a session.
pub fn install(connection: Connection) -> Arc<Connection> {
    let connection = Arc::new(connection);
    install_session_source(Arc::clone(&connection) as Arc<dyn SessionSource>);
    connection
}

/// Resolves a connection and installs it as the default.
pub fn connect(uri: Option<&str>) -> HojoResult<Arc<Connection>> {
    Ok(install(Connection::new(uri)?))
}

/// Removes the default connection.
pub fn reset() {
    reset_session_source();
}
