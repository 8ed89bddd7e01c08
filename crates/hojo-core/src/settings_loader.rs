//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `HOJO_DB_URI` | `db_uri` |
//! | `HOJO_DEBUG` | `debug` |
//! | `HOJO_LOG_LEVEL` | `log_level` |
//!
//! ```rust,no_run
//! use hojo_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("hojo.toml").unwrap();
//! settings.apply();
//! ```

use std::path::Path;

use crate::error::HojoError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Keys missing from the TOML keep their default values.
///
/// # Errors
///
/// Returns [`HojoError::Configuration`] if the TOML is malformed or does not
/// fit [`Settings`].
pub fn from_toml_str(toml_str: &str) -> Result<Settings, HojoError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| HojoError::Configuration(format!("Failed to parse TOML: {e}")))?;
    merge_into_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, HojoError> {
    let content = read(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, HojoError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, HojoError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| HojoError::Configuration(format!("Failed to parse JSON: {e}")))?;
    merge_into_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, HojoError> {
    let content = read(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `HOJO_*` environment variable overrides to a settings struct.
///
/// `HOJO_DEBUG` accepts "true", "1" or "yes" (case-insensitive) as true;
/// anything else is false.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("HOJO_DB_URI") {
        if !val.is_empty() {
            settings.db_uri = Some(val);
        }
    }

    if let Ok(val) = std::env::var("HOJO_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("HOJO_LOG_LEVEL") {
        settings.log_level = val;
    }
}

// ============================================================
// Helpers
// ============================================================

fn read(path: &Path, format: &str) -> Result<String, HojoError> {
    std::fs::read_to_string(path).map_err(|e| {
        HojoError::Configuration(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_into_defaults(value: serde_json::Value, format: &str) -> Result<Settings, HojoError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        HojoError::Configuration(format!("Failed to serialize default settings: {e}"))
    })?;
    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        HojoError::Configuration(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
