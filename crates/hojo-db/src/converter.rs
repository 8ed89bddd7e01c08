//! The converter registry: type-directed structuring and unstructuring.
//!
//! *Structuring* turns a raw JSON value into a typed [`Value`] for a declared
//! [`FieldType`]; *unstructuring* is the reverse. Hooks are keyed either by an
//! exact type key (see [`FieldType::type_key`]) or by a [`TypeCategory`], and
//! are resolved in a fixed order:
//!
//! 1. the exact type hook,
//! 2. the category hook,
//! 3. the primitive default (`bool`, `int`, `float`, `str`, `json`),
//! 4. failure with [`ConversionError`].
//!
//! [`Converter::new`] comes with hooks for UUIDs, both enumeration categories
//! and temporal values. The canonical text forms are the hyphenated UUID,
//! `YYYY-MM-DD` for dates and RFC 3339 (`Z` for UTC) for timestamps.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDate, SecondsFormat};
use hojo_core::{ConversionError, HojoError, HojoResult};
use serde_json::Value as JsonValue;

use crate::fields::{FieldType, TypeCategory};
use crate::value::Value;

/// A structuring hook: raw JSON to a typed value.
pub type StructureFn =
    Arc<dyn Fn(&JsonValue, &FieldType) -> Result<Value, ConversionError> + Send + Sync>;

/// An unstructuring hook: typed value to raw JSON.
pub type UnstructureFn =
    Arc<dyn Fn(&Value, &FieldType) -> Result<JsonValue, ConversionError> + Send + Sync>;

/// What a hook is registered against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookKey {
    /// An exact type key such as "uuid" or an enumeration's name.
    Exact(String),
    /// Every type in a category.
    Category(TypeCategory),
}

impl From<&str> for HookKey {
    fn from(key: &str) -> Self {
        Self::Exact(key.to_string())
    }
}

impl From<TypeCategory> for HookKey {
    fn from(category: TypeCategory) -> Self {
        Self::Category(category)
    }
}

/// A hook together with its direction.
#[derive(Clone)]
pub enum ConversionHook {
    /// Generic to typed.
    Structure(StructureFn),
    /// Typed to generic.
    Unstructure(UnstructureFn),
}

/// The converter registry.
///
/// # Examples
///
/// ```
/// use hojo_db::converter::Converter;
/// use hojo_db::fields::FieldType;
/// use hojo_db::value::Value;
/// use serde_json::json;
///
/// let converter = Converter::new();
/// let v = converter.structure(&json!("2024-01-15"), &FieldType::Date).unwrap();
/// assert!(matches!(v, Value::Date(_)));
/// assert_eq!(converter.unstructure(&v, &FieldType::Date).unwrap(), json!("2024-01-15"));
/// ```
#[derive(Clone, Default)]
pub struct Converter {
    structure_hooks: HashMap<HookKey, StructureFn>,
    unstructure_hooks: HashMap<HookKey, UnstructureFn>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("structure_hooks", &self.structure_hooks.keys().collect::<Vec<_>>())
            .field(
                "unstructure_hooks",
                &self.unstructure_hooks.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

static GLOBAL: OnceLock<Converter> = OnceLock::new();

impl Converter {
    /// Creates a converter with the built-in hooks registered.
    pub fn new() -> Self {
        let mut converter = Self::empty();
        converter.register_structure_hook("uuid", structure_uuid);
        converter.register_unstructure_hook("uuid", unstructure_uuid);
        converter.register_structure_hook(TypeCategory::StrEnum, structure_str_enum);
        converter.register_unstructure_hook(TypeCategory::StrEnum, unstructure_str_enum);
        converter.register_structure_hook(TypeCategory::IntEnum, structure_int_enum);
        converter.register_unstructure_hook(TypeCategory::IntEnum, unstructure_int_enum);
        converter.register_structure_hook(TypeCategory::Temporal, structure_temporal);
        converter.register_unstructure_hook(TypeCategory::Temporal, unstructure_temporal);
        converter
    }

    /// Creates a converter with no hooks; only primitive defaults apply.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the process-wide converter, creating it with the built-ins on
    /// first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Installs the process-wide converter. Must run before the first call to
    /// [`Converter::global`].
    pub fn install(converter: Self) -> HojoResult<()> {
        GLOBAL.set(converter).map_err(|_| {
            HojoError::Configuration("the global converter is already initialized".into())
        })
    }

    /// Registers a hook. A later registration for the same key and direction
    /// replaces the earlier one.
    pub fn register(&mut self, key: impl Into<HookKey>, hook: ConversionHook) {
        let key = key.into();
        tracing::debug!(?key, "registering converter hook");
        match hook {
            ConversionHook::Structure(f) => {
                self.structure_hooks.insert(key, f);
            }
            ConversionHook::Unstructure(f) => {
                self.unstructure_hooks.insert(key, f);
            }
        }
    }

    /// Registers a structuring hook.
    pub fn register_structure_hook<F>(&mut self, key: impl Into<HookKey>, hook: F)
    where
        F: Fn(&JsonValue, &FieldType) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.register(key, ConversionHook::Structure(Arc::new(hook)));
    }

    /// Registers an unstructuring hook.
    pub fn register_unstructure_hook<F>(&mut self, key: impl Into<HookKey>, hook: F)
    where
        F: Fn(&Value, &FieldType) -> Result<JsonValue, ConversionError> + Send + Sync + 'static,
    {
        self.register(key, ConversionHook::Unstructure(Arc::new(hook)));
    }

    fn resolve<'a, T>(map: &'a HashMap<HookKey, T>, field_type: &FieldType) -> Option<&'a T> {
        map.get(&HookKey::Exact(field_type.type_key().to_string()))
            .or_else(|| {
                field_type
                    .category()
                    .and_then(|c| map.get(&HookKey::Category(c)))
            })
    }

    /// Structures a raw value into the declared type. JSON null structures to
    /// [`Value::Null`] for every type.
    pub fn structure(&self, raw: &JsonValue, field_type: &FieldType) -> Result<Value, ConversionError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        if let Some(hook) = Self::resolve(&self.structure_hooks, field_type) {
            return hook(raw, field_type);
        }
        structure_primitive(raw, field_type)
    }

    /// Unstructures a typed value. [`Value::Null`] unstructures to JSON null.
    pub fn unstructure(&self, value: &Value, field_type: &FieldType) -> Result<JsonValue, ConversionError> {
        if value.is_null() {
            return Ok(JsonValue::Null);
        }
        if let Some(hook) = Self::resolve(&self.unstructure_hooks, field_type) {
            return hook(value, field_type);
        }
        unstructure_primitive(value, field_type)
    }
}

// ── Primitive defaults ─────────────────────────────────────────────────

/// A float that is a whole number inside the `i64` range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn structure_primitive(raw: &JsonValue, field_type: &FieldType) -> Result<Value, ConversionError> {
    let err = |msg: String| ConversionError::new(field_type.type_key(), msg);
    match field_type {
        FieldType::Bool => raw
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| err(format!("Not a valid boolean: {raw}"))),
        FieldType::Int => match raw {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(whole_i64))
                .map(Value::Int)
                .ok_or_else(|| err(format!("Not a valid integer: {raw}"))),
            JsonValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| err(format!("Not a valid integer: {raw}"))),
            _ => Err(err(format!("Not a valid integer: {raw}"))),
        },
        FieldType::Float => match raw {
            JsonValue::Number(n) => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| err(format!("Not a valid number: {raw}"))),
            JsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| err(format!("Not a valid number: {raw}"))),
            _ => Err(err(format!("Not a valid number: {raw}"))),
        },
        FieldType::String => raw
            .as_str()
            .map(Value::from)
            .ok_or_else(|| err(format!("Not a valid string: {raw}"))),
        FieldType::Json => Ok(Value::Json(raw.clone())),
        _ => Err(err("no structure hook registered".into())),
    }
}

fn unstructure_primitive(value: &Value, field_type: &FieldType) -> Result<JsonValue, ConversionError> {
    match (field_type, value) {
        (FieldType::Bool, Value::Bool(b)) => Ok(JsonValue::Bool(*b)),
        (FieldType::Int, Value::Int(i)) => Ok(JsonValue::from(*i)),
        (FieldType::Float, Value::Float(f)) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| ConversionError::new("float", format!("{f} has no JSON form"))),
        #[allow(clippy::cast_precision_loss)]
        (FieldType::Float, Value::Int(i)) => Ok(JsonValue::from(*i as f64)),
        (FieldType::String, Value::String(s)) => Ok(JsonValue::String(s.clone())),
        (FieldType::Json, Value::Json(j)) => Ok(j.clone()),
        (FieldType::Bool | FieldType::Int | FieldType::Float | FieldType::String | FieldType::Json, other) => {
            Err(ConversionError::new(
                field_type.type_key(),
                format!("unexpected {} value {other}", other.kind()),
            ))
        }
        _ => Err(ConversionError::new(
            field_type.type_key(),
            "no unstructure hook registered",
        )),
    }
}

// ── Built-in hooks ─────────────────────────────────────────────────────

fn expect_str<'a>(raw: &'a JsonValue, field_type: &FieldType) -> Result<&'a str, ConversionError> {
    raw.as_str().ok_or_else(|| {
        ConversionError::new(field_type.type_key(), format!("expected a string, got {raw}"))
    })
}

fn structure_uuid(raw: &JsonValue, field_type: &FieldType) -> Result<Value, ConversionError> {
    let s = expect_str(raw, field_type)?;
    uuid::Uuid::parse_str(s)
        .map(Value::Uuid)
        .map_err(|e| ConversionError::new("uuid", format!("Not a valid UUID: {e}")))
}

fn unstructure_uuid(value: &Value, _: &FieldType) -> Result<JsonValue, ConversionError> {
    match value {
        Value::Uuid(u) => Ok(JsonValue::String(u.hyphenated().to_string())),
        Value::String(s) => uuid::Uuid::parse_str(s)
            .map(|u| JsonValue::String(u.hyphenated().to_string()))
            .map_err(|e| ConversionError::new("uuid", e.to_string())),
        other => Err(ConversionError::new(
            "uuid",
            format!("unexpected {} value {other}", other.kind()),
        )),
    }
}

fn str_member(value: &str, field_type: &FieldType) -> Result<Value, ConversionError> {
    match field_type {
        FieldType::StrEnum { choices, .. } if choices.contains(&value) => Ok(Value::from(value)),
        FieldType::StrEnum { name, choices } => Err(ConversionError::new(
            *name,
            format!("'{value}' is not one of {choices:?}"),
        )),
        other => Err(ConversionError::new(other.type_key(), "not a string enumeration")),
    }
}

fn int_member(value: i64, field_type: &FieldType) -> Result<Value, ConversionError> {
    match field_type {
        FieldType::IntEnum { choices, .. } if choices.contains(&value) => Ok(Value::Int(value)),
        FieldType::IntEnum { name, choices } => Err(ConversionError::new(
            *name,
            format!("{value} is not one of {choices:?}"),
        )),
        other => Err(ConversionError::new(other.type_key(), "not an integer enumeration")),
    }
}

fn structure_str_enum(raw: &JsonValue, field_type: &FieldType) -> Result<Value, ConversionError> {
    str_member(expect_str(raw, field_type)?, field_type)
}

fn unstructure_str_enum(value: &Value, field_type: &FieldType) -> Result<JsonValue, ConversionError> {
    match value {
        Value::String(s) => str_member(s, field_type).map(|_| JsonValue::String(s.clone())),
        other => Err(ConversionError::new(
            field_type.type_key(),
            format!("unexpected {} value {other}", other.kind()),
        )),
    }
}

fn structure_int_enum(raw: &JsonValue, field_type: &FieldType) -> Result<Value, ConversionError> {
    let i = raw.as_i64().ok_or_else(|| {
        ConversionError::new(field_type.type_key(), format!("expected an integer, got {raw}"))
    })?;
    int_member(i, field_type)
}

fn unstructure_int_enum(value: &Value, field_type: &FieldType) -> Result<JsonValue, ConversionError> {
    match value {
        Value::Int(i) => int_member(*i, field_type).map(|_| JsonValue::from(*i)),
        other => Err(ConversionError::new(
            field_type.type_key(),
            format!("unexpected {} value {other}", other.kind()),
        )),
    }
}

fn structure_temporal(raw: &JsonValue, field_type: &FieldType) -> Result<Value, ConversionError> {
    let s = expect_str(raw, field_type)?;
    match field_type {
        FieldType::Date => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|e| ConversionError::new("date", format!("Not a valid date '{s}': {e}"))),
        FieldType::DateTime => DateTime::parse_from_rfc3339(s)
            .map(Value::DateTime)
            .map_err(|e| {
                ConversionError::new("datetime", format!("Not a valid datetime '{s}': {e}"))
            }),
        other => Err(ConversionError::new(other.type_key(), "not a temporal type")),
    }
}

fn unstructure_temporal(value: &Value, field_type: &FieldType) -> Result<JsonValue, ConversionError> {
    match (field_type, value) {
        (FieldType::Date, Value::Date(d)) => Ok(JsonValue::String(d.format("%Y-%m-%d").to_string())),
        (FieldType::DateTime, Value::DateTime(dt)) => Ok(JsonValue::String(
            dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )),
        (_, other) => Err(ConversionError::new(
            field_type.type_key(),
            format!("unexpected {} value {other}", other.kind()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ROLE: FieldType = FieldType::StrEnum {
        name: "Role",
        choices: &["admin", "member"],
    };
    const LEVEL: FieldType = FieldType::IntEnum {
        name: "Level",
        choices: &[1, 2, 3],
    };

    fn roundtrip(raw: JsonValue, ft: FieldType) {
        let c = Converter::new();
        let typed = c.structure(&raw, &ft).unwrap();
        assert_eq!(c.unstructure(&typed, &ft).unwrap(), raw);
        let again = c.structure(&c.unstructure(&typed, &ft).unwrap(), &ft).unwrap();
        assert_eq!(again, typed);
    }

    #[test]
    fn test_builtin_roundtrips() {
        roundtrip(json!("67e55044-10b1-426f-9247-bb680e5fe0c8"), FieldType::Uuid);
        roundtrip(json!("2024-02-29"), FieldType::Date);
        roundtrip(json!("2024-01-15T12:30:00Z"), FieldType::DateTime);
        roundtrip(json!("2024-01-15T12:30:00+02:00"), FieldType::DateTime);
        roundtrip(json!("2024-01-15T12:30:00.123456Z"), FieldType::DateTime);
        roundtrip(json!("admin"), ROLE);
        roundtrip(json!(2), LEVEL);
        roundtrip(json!(30), FieldType::Int);
        roundtrip(json!(1.5), FieldType::Float);
        roundtrip(json!(true), FieldType::Bool);
        roundtrip(json!("Cloud"), FieldType::String);
        roundtrip(json!({"hp": 9999}), FieldType::Json);
    }

    #[test]
    fn test_numeric_text_is_accepted_for_int() {
        let c = Converter::new();
        assert_eq!(c.structure(&json!("30"), &FieldType::Int).unwrap(), Value::Int(30));
        assert_eq!(c.structure(&json!(30.0), &FieldType::Int).unwrap(), Value::Int(30));
    }

    #[test]
    fn test_non_numeric_text_is_rejected() {
        let c = Converter::new();
        let err = c.structure(&json!("thirty"), &FieldType::Int).unwrap_err();
        assert_eq!(err.target, "int");
        assert!(c.structure(&json!(30.5), &FieldType::Int).is_err());
        assert!(c.structure(&json!(1e20), &FieldType::Int).is_err());
        assert!(c.structure(&json!(-1e20), &FieldType::Int).is_err());
        assert_eq!(c.structure(&json!(30.0), &FieldType::Int).unwrap(), Value::Int(30));
        assert!(c.structure(&json!("1"), &FieldType::Bool).is_err());
        assert!(c.structure(&json!(1), &FieldType::String).is_err());
    }

    #[test]
    fn test_enum_membership_is_checked() {
        let c = Converter::new();
        assert!(c.structure(&json!("guest"), &ROLE).is_err());
        assert!(c.structure(&json!(7), &LEVEL).is_err());
        assert!(c.unstructure(&Value::from("guest"), &ROLE).is_err());
    }

    #[test]
    fn test_uuid_canonical_form() {
        let c = Converter::new();
        let typed = c
            .structure(&json!("67E55044-10B1-426F-9247-BB680E5FE0C8"), &FieldType::Uuid)
            .unwrap();
        assert_eq!(
            c.unstructure(&typed, &FieldType::Uuid).unwrap(),
            json!("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
        assert!(c.structure(&json!("not-a-uuid"), &FieldType::Uuid).is_err());
    }

    #[test]
    fn test_null_passes_through() {
        let c = Converter::new();
        assert_eq!(c.structure(&JsonValue::Null, &FieldType::Uuid).unwrap(), Value::Null);
        assert_eq!(c.unstructure(&Value::Null, &ROLE).unwrap(), JsonValue::Null);
    }

    #[test]
    fn test_exact_hook_beats_category_hook() {
        let mut c = Converter::new();
        c.register_unstructure_hook("datetime", |_, _| Ok(json!("exact")));
        let dt = c.structure(&json!("2024-01-15T12:30:00Z"), &FieldType::DateTime).unwrap();
        assert_eq!(c.unstructure(&dt, &FieldType::DateTime).unwrap(), json!("exact"));
        // Dates still go through the temporal category hook.
        let d = c.structure(&json!("2024-01-15"), &FieldType::Date).unwrap();
        assert_eq!(c.unstructure(&d, &FieldType::Date).unwrap(), json!("2024-01-15"));
    }

    #[test]
    fn test_category_hook_beats_primitive_default() {
        let mut c = Converter::empty();
        c.register_structure_hook(TypeCategory::StrEnum, |raw, _| {
            Ok(Value::from(raw.as_str().unwrap_or_default().to_uppercase()))
        });
        assert_eq!(c.structure(&json!("admin"), &ROLE).unwrap(), Value::from("ADMIN"));
    }

    #[test]
    fn test_register_with_direction() {
        let mut c = Converter::empty();
        c.register(
            "Role",
            ConversionHook::Unstructure(Arc::new(|v: &Value, _: &FieldType| {
                Ok(json!(format!("role:{v}")))
            })),
        );
        assert_eq!(
            c.unstructure(&Value::from("admin"), &ROLE).unwrap(),
            json!("role:admin")
        );
        // No structure hook for Role and no primitive default: fails.
        assert!(c.structure(&json!("admin"), &ROLE).is_err());
    }

    #[test]
    fn test_empty_converter_fails_without_hooks() {
        let c = Converter::empty();
        let err = c.structure(&json!("2024-01-15"), &FieldType::Date).unwrap_err();
        assert_eq!(err.target, "date");
        assert!(c
            .unstructure(&Value::Uuid(uuid::Uuid::nil()), &FieldType::Uuid)
            .is_err());
        assert_eq!(c.structure(&json!(3), &FieldType::Int).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_mismatched_value_fails_to_unstructure() {
        let c = Converter::new();
        assert!(c.unstructure(&Value::from("x"), &FieldType::Int).is_err());
        assert!(c.unstructure(&Value::Int(1), &FieldType::Date).is_err());
    }

    #[test]
    fn test_global_is_shared() {
        let a = Converter::global() as *const Converter;
        let b = Converter::global() as *const Converter;
        assert_eq!(a, b);
    }
}
