//! Loading models from plain mappings and dumping them back.
//!
//! Every [`Model`] is a [`Schema`]: it can be loaded from a JSON object and
//! dumped to one, with each field converted by a [`Converter`]. The plain
//! forms use the converter's canonical representations, so a dump loads back
//! into an equal instance.
//!
//! # Examples
//!
//! ```ignore
//! let user = User::load(&json!({"name": "Jane"}))?;
//! assert_eq!(user.dump(&DumpOptions::default())?, json!({"name": "Jane", "age": null}));
//! assert_eq!(user.dump(&DumpOptions::default().skip_none())?, json!({"name": "Jane"}));
//! ```

use std::collections::BTreeMap;

use hojo_core::{HojoError, HojoResult, ValidationError};
use serde_json::{Map, Value as JsonValue};

use crate::converter::Converter;
use crate::model::{Model, Row};
use crate::value::Value;

/// Which fields a dump emits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Drop fields whose value is null.
    pub skip_none: bool,
    /// Keep only these fields.
    pub only: Option<Vec<String>>,
    /// Drop these fields.
    pub exclude: Option<Vec<String>>,
}

impl DumpOptions {
    /// Drops null fields from the output.
    #[must_use]
    pub const fn skip_none(mut self) -> Self {
        self.skip_none = true;
        self
    }

    /// Restricts the output to the given fields.
    #[must_use]
    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Removes the given fields from the output.
    #[must_use]
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// `only` is applied first; `exclude` then removes from what is left.
    fn keeps(&self, field: &str) -> bool {
        let listed = |names: &Option<Vec<String>>| {
            names.as_ref().map(|names| names.iter().any(|n| n == field))
        };
        listed(&self.only).unwrap_or(true) && !listed(&self.exclude).unwrap_or(false)
    }
}

/// Conversion between a model and its plain mapping form.
pub trait Schema: Model {
    /// Loads an instance through the global converter.
    fn load(raw: &JsonValue) -> HojoResult<Self> {
        Self::load_with(Converter::global(), raw)
    }

    /// Loads an instance from a JSON object.
    ///
    /// Unknown keys are ignored. A missing field takes its default, or null
    /// when nullable; a missing required field, a null for a non-nullable
    /// field and a value of the wrong shape are all reported together in a
    /// single [`ValidationError`] keyed by field.
    fn load_with(converter: &Converter, raw: &JsonValue) -> HojoResult<Self> {
        let Some(object) = raw.as_object() else {
            return Err(ValidationError::new(
                format!("Invalid input type: expected an object, got {raw}"),
                "invalid",
            )
            .into());
        };

        let meta = Self::meta();
        let mut columns = Vec::new();
        let mut values = Vec::new();
        let mut errors: BTreeMap<String, Vec<ValidationError>> = BTreeMap::new();

        for field in meta.column_fields() {
            let value = match object.get(field.name) {
                None => match &field.default {
                    Some(default) => Ok(default.produce()),
                    None if field.null => Ok(Value::Null),
                    None => Err(ValidationError::new("Missing data for required field.", "required")),
                },
                Some(JsonValue::Null) if !field.null => {
                    Err(ValidationError::new("Field may not be null.", "null"))
                }
                Some(raw_value) => converter
                    .structure(raw_value, &field.field_type)
                    .map_err(|e| ValidationError::new(e.message, "invalid")),
            };
            match value {
                Ok(value) => {
                    columns.push(field.name.to_string());
                    values.push(value);
                }
                Err(error) => errors.entry(field.name.to_string()).or_default().push(error),
            }
        }

        if !errors.is_empty() {
            return Err(ValidationError::with_field_errors(errors).into());
        }
        Self::from_row(&Row::new(columns, values))
    }

    /// Loads an instance from JSON text.
    fn loads(text: &str) -> HojoResult<Self> {
        Self::load(&serde_json::from_str(text)?)
    }

    /// Loads an instance from another model's dump.
    fn load_instance<S: Schema>(other: &S) -> HojoResult<Self> {
        Self::load(&other.dump(&DumpOptions::default())?)
    }

    /// Dumps through the global converter.
    fn dump(&self, options: &DumpOptions) -> HojoResult<JsonValue> {
        self.dump_with(Converter::global(), options)
    }

    /// Dumps to a JSON object in field declaration order.
    fn dump_with(&self, converter: &Converter, options: &DumpOptions) -> HojoResult<JsonValue> {
        let values = self.column_values()?;
        let mut out = Map::new();
        for (field, (_, value)) in Self::meta().column_fields().zip(&values) {
            if !options.keeps(field.name) {
                continue;
            }
            let raw = converter.unstructure(value, &field.field_type)?;
            if options.skip_none && raw.is_null() {
                continue;
            }
            out.insert(field.name.to_string(), raw);
        }
        Ok(JsonValue::Object(out))
    }

    /// Dumps to JSON text through the global converter.
    fn dumps(&self, options: &DumpOptions) -> HojoResult<String> {
        self.dumps_with(Converter::global(), options)
    }

    /// Dumps to JSON text.
    fn dumps_with(&self, converter: &Converter, options: &DumpOptions) -> HojoResult<String> {
        serde_json::to_string(&self.dump_with(converter, options)?)
            .map_err(|e| HojoError::Serialization(e.to_string()))
    }
}

impl<M: Model> Schema for M {}
