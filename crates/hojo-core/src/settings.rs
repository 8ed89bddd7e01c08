//! Typed settings for hojo.
//!
//! [`Settings`] holds the handful of options the ORM and its logging need. It is
//! usually loaded once at start-up through [`settings_loader`](crate::settings_loader)
//! and then pushed into the process-wide [`Config`](crate::config::Config) store
//! with [`Settings::apply`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{Config, DB_URI_KEY, DEBUG_KEY, LOG_LEVEL_KEY};

/// The complete set of hojo settings.
///
/// # Examples
///
/// ```
/// use hojo_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.log_level, "info");
/// assert!(settings.db_uri.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log level filter (e.g. "info", "hojo_db=debug").
    pub log_level: String,
    /// The database connection URI.
    pub db_uri: Option<String>,
    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            db_uri: None,
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Writes these settings into the process-wide [`Config`] store.
    pub fn apply(&self) {
        Config::set(DEBUG_KEY, self.debug);
        Config::set(LOG_LEVEL_KEY, self.log_level.clone());
        if let Some(uri) = &self.db_uri {
            Config::set(DB_URI_KEY, uri.clone());
        }
        for (key, value) in &self.extra {
            Config::set(key, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert!(s.db_uri.is_none());
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_settings_serde_roundtrip() {
        let mut s = Settings::default();
        s.db_uri = Some("sqlite::memory:".to_string());
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
