//! Model trait and metadata for the ORM.
//!
//! The [`Model`] trait is the core abstraction every hojo model implements.
//! It provides access to metadata, field values, and construction from rows.
//! A model is a named, ordered set of typed fields; [`ModelMeta`] holds that
//! set and the table name derived from it.

use std::sync::OnceLock;

use hojo_core::{ConversionError, HojoResult};

use crate::fields::FieldDef;
use crate::query::queryset::Manager;
use crate::value::Value;

pub use crate::query::compiler::Row;

/// The name of the conventional primary key field.
pub const PK_FIELD: &str = "id";

/// The core trait for all ORM models.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use hojo_core::HojoResult;
/// use hojo_db::fields::{FieldDef, FieldType};
/// use hojo_db::model::{Model, ModelMeta, Row};
/// use hojo_db::value::Value;
///
/// #[derive(Clone)]
/// struct Weapon {
///     name: String,
///     level: i64,
/// }
///
/// impl Model for Weapon {
///     fn meta() -> &'static ModelMeta {
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
///             ModelMeta::new(
///                 "Weapon",
///                 vec![
///                     FieldDef::new("name", FieldType::String),
///                     FieldDef::new("level", FieldType::Int),
///                 ],
///             )
///         });
///         &META
///     }
///
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("name", Value::from(&self.name)), ("level", Value::Int(self.level))]
///     }
///
///     fn from_row(row: &Row) -> HojoResult<Self> {
///         Ok(Self {
///             name: row.get("name")?,
///             level: row.get("level")?,
///         })
///     }
/// }
///
/// assert_eq!(Weapon::table_name(), "weapons");
/// ```
pub trait Model: Clone + Send + Sync + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns every scalar field's name and value in declaration order.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Constructs a model instance from a row keyed by field name.
    fn from_row(row: &Row) -> HojoResult<Self>;

    /// Returns [`field_values`](Self::field_values) reduced to the column
    /// fields, in declaration order.
    ///
    /// Fails with a conversion error naming the first column field that
    /// `field_values` does not provide.
    fn column_values(&self) -> HojoResult<Vec<(&'static str, Value)>> {
        let mut values = self.field_values();
        let meta = Self::meta();
        meta.column_fields()
            .map(|field| {
                let pos = values
                    .iter()
                    .position(|(name, _)| *name == field.name)
                    .ok_or_else(|| {
                        ConversionError::new(
                            field.field_type.type_key(),
                            format!("{}.{} has no value in field_values()", meta.name, field.name),
                        )
                    })?;
                Ok((field.name, values.swap_remove(pos).1))
            })
            .collect()
    }

    /// Returns the database table name.
    fn table_name() -> &'static str {
        Self::meta().table_name()
    }

    /// Returns the name of the primary key field.
    fn pk_field_name() -> &'static str {
        Self::meta().pk_field().map_or(PK_FIELD, |f| f.name)
    }

    /// Returns the primary key value, or `None` when it is unset.
    fn pk(&self) -> Option<Value> {
        let pk_name = Self::pk_field_name();
        self.field_values()
            .into_iter()
            .find(|(name, _)| *name == pk_name)
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    }

    /// Returns a fresh manager for this model.
    fn objects() -> Manager<Self> {
        Manager::new()
    }
}

/// Static metadata about a model: its name and fields.
pub struct ModelMeta {
    /// The model name as declared (e.g. "User").
    pub name: &'static str,
    /// Field definitions in declaration order.
    pub fields: Vec<FieldDef>,
    table_name: OnceLock<String>,
}

impl ModelMeta {
    /// Creates metadata for the named model.
    pub fn new(name: &'static str, fields: Vec<FieldDef>) -> Self {
        Self {
            name,
            fields,
            table_name: OnceLock::new(),
        }
    }

    /// The table name: the lower-cased model name, pluralized.
    pub fn table_name(&self) -> &str {
        self.table_name
            .get_or_init(|| pluralizer::pluralize(&self.name.to_lowercase(), 2, false))
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields backed by a column, in declaration order.
    pub fn column_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.is_relation())
    }

    /// Relationship fields, in declaration order.
    pub fn relation_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_relation())
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.column_fields().map(|f| f.name).collect()
    }

    /// Returns `true` if `name` is a column of this model.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_fields().any(|f| f.name == name)
    }

    /// The primary key: the field flagged `primary_key`, else the field named `id`.
    pub fn pk_field(&self) -> Option<&FieldDef> {
        self.column_fields()
            .find(|f| f.primary_key)
            .or_else(|| self.column_fields().find(|f| f.name == PK_FIELD))
    }
}

impl std::fmt::Debug for ModelMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelMeta")
            .field("name", &self.name)
            .field("fields", &self.fields.iter().map(|f| f.name).collect::<Vec<_>>())
            .finish()
    }
}
