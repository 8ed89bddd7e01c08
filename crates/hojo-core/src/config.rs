//! Process-wide key/value configuration store.
//!
//! [`Config`] is created lazily on first use and lives for the whole process.
//! Values are written during start-up and read afterwards; nothing is persisted
//! across restarts. [`Config::reset`] exists for test harnesses.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use serde_json::Value;

/// Key holding the database connection URI.
pub const DB_URI_KEY: &str = "db_uri";
/// Key holding the debug flag.
pub const DEBUG_KEY: &str = "debug";
/// Key holding the log level filter.
pub const LOG_LEVEL_KEY: &str = "log_level";

fn store() -> &'static RwLock<HashMap<String, Value>> {
    static STORE: OnceLock<RwLock<HashMap<String, Value>>> = OnceLock::new();
    STORE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The process-wide configuration store.
///
/// # Examples
///
/// ```
/// use hojo_core::config::Config;
///
/// Config::set("page_size", 50);
/// assert_eq!(Config::get("page_size"), Some(serde_json::json!(50)));
/// assert_eq!(Config::get("missing"), None);
/// ```
pub struct Config;

impl Config {
    /// Sets a configuration value, replacing any previous one.
    pub fn set(key: impl Into<String>, value: impl Into<Value>) {
        store()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(key: &str) -> Option<Value> {
        store()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Returns the value under `key` if it is a string.
    pub fn get_str(key: &str) -> Option<String> {
        match Self::get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Removes a single key.
    pub fn remove(key: &str) -> Option<Value> {
        store()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Clears every stored value.
    pub fn reset() {
        store()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
