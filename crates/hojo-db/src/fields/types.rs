//! Field type definitions for the ORM.
//!
//! A model is a named, ordered set of [`FieldDef`]s. Each definition carries the
//! field's [`FieldType`] (which drives conversion and column mapping) and the
//! per-field metadata: primary key, nullability, defaults, index and unique
//! flags, and an optional relationship marker.

use std::fmt;

use crate::value::Value;

/// The declared type of a model field.
///
/// Enumeration types carry their name (the converter's exact type key) and the
/// allowed members, so membership is checked on both conversion directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Text.
    String,
    /// UUID, exchanged as its hyphenated string form.
    Uuid,
    /// Calendar date, exchanged as `YYYY-MM-DD`.
    Date,
    /// Timestamp with offset, exchanged as RFC 3339.
    DateTime,
    /// An arbitrary JSON document. Schemas accept it; the mapper does not.
    Json,
    /// An enumeration backed by strings.
    StrEnum {
        /// The enumeration's type name (e.g. "Role").
        name: &'static str,
        /// Allowed members.
        choices: &'static [&'static str],
    },
    /// An enumeration backed by integers.
    IntEnum {
        /// The enumeration's type name (e.g. "Level").
        name: &'static str,
        /// Allowed members.
        choices: &'static [i64],
    },
}

/// A family of field types that share converter hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// Any string-backed enumeration.
    StrEnum,
    /// Any integer-backed enumeration.
    IntEnum,
    /// Dates and timestamps.
    Temporal,
}

impl FieldType {
    /// The exact type key used for converter dispatch.
    ///
    /// Primitive types use their short names ("int", "str", ...); enumerations
    /// use their declared name.
    pub const fn type_key(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "str",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Json => "json",
            Self::StrEnum { name, .. } | Self::IntEnum { name, .. } => *name,
        }
    }

    /// The category this type belongs to, if any.
    pub const fn category(&self) -> Option<TypeCategory> {
        match self {
            Self::StrEnum { .. } => Some(TypeCategory::StrEnum),
            Self::IntEnum { .. } => Some(TypeCategory::IntEnum),
            Self::Date | Self::DateTime => Some(TypeCategory::Temporal),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_key())
    }
}

/// An index or unique marker on a field.
///
/// `Single` is a one-column constraint; `Group` fields sharing the same group
/// key are combined into one composite constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Constraint {
    /// No constraint.
    #[default]
    None,
    /// A single-column constraint.
    Single,
    /// Membership in a named composite constraint.
    Group(&'static str),
}

/// The kind of a relationship marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// One-to-many.
    HasMany,
    /// Many-to-one.
    BelongsTo,
    /// One-to-one.
    HasOne,
}

/// A relationship marker on a field. Recorded by the mapper, never resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// The relationship kind.
    pub kind: RelationKind,
    /// The related model's name.
    pub to: &'static str,
}

/// How a missing field gets its value on load.
#[derive(Clone)]
pub enum FieldDefault {
    /// A fixed value.
    Value(Value),
    /// A factory called once per load (e.g. a fresh id or the current time).
    Factory(fn() -> Value),
}

impl FieldDefault {
    /// Produces the default value.
    pub fn produce(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Complete definition of a model field.
///
/// # Examples
///
/// ```
/// use hojo_db::fields::{FieldDef, FieldType, Constraint};
///
/// let f = FieldDef::new("email", FieldType::String).unique().index_group("contact");
/// assert_eq!(f.unique, Constraint::Single);
/// assert_eq!(f.index, Constraint::Group("contact"));
/// ```
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The field (and column) name.
    pub name: &'static str,
    /// The declared type.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether the field accepts null.
    pub null: bool,
    /// The value used when the field is missing on load.
    pub default: Option<FieldDefault>,
    /// Index marker.
    pub index: Constraint,
    /// Unique marker.
    pub unique: Constraint,
    /// Relationship marker.
    pub relation: Option<Relation>,
}

impl FieldDef {
    /// Creates a new, non-null `FieldDef` with no default and no constraints.
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            primary_key: false,
            null: false,
            default: None,
            index: Constraint::None,
            unique: Constraint::None,
            relation: None,
        }
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows null values. Missing nullable fields load as null.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Adds a single-column index.
    #[must_use]
    pub const fn index(mut self) -> Self {
        self.index = Constraint::Single;
        self
    }

    /// Adds the field to a named composite index.
    #[must_use]
    pub const fn index_group(mut self, group: &'static str) -> Self {
        self.index = Constraint::Group(group);
        self
    }

    /// Adds a single-column unique constraint.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = Constraint::Single;
        self
    }

    /// Adds the field to a named composite unique constraint.
    #[must_use]
    pub const fn unique_group(mut self, group: &'static str) -> Self {
        self.unique = Constraint::Group(group);
        self
    }

    /// Sets a fixed default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Sets a default factory.
    #[must_use]
    pub fn default_with(mut self, factory: fn() -> Value) -> Self {
        self.default = Some(FieldDefault::Factory(factory));
        self
    }

    /// Marks this field as a one-to-many relationship to `to`.
    #[must_use]
    pub const fn has_many(self, to: &'static str) -> Self {
        self.relation(RelationKind::HasMany, to)
    }

    /// Marks this field as a many-to-one relationship to `to`.
    #[must_use]
    pub const fn belongs_to(self, to: &'static str) -> Self {
        self.relation(RelationKind::BelongsTo, to)
    }

    /// Marks this field as a one-to-one relationship to `to`.
    #[must_use]
    pub const fn has_one(self, to: &'static str) -> Self {
        self.relation(RelationKind::HasOne, to)
    }

    const fn relation(mut self, kind: RelationKind, to: &'static str) -> Self {
        self.relation = Some(Relation { kind, to });
        self
    }

    /// Returns `true` if this field carries a relationship marker.
    pub const fn is_relation(&self) -> bool {
        self.relation.is_some()
    }
}

/// The standard identity and timestamp fields: `id` (a time-ordered UUID
/// primary key), `created_at` and `updated_at` (both defaulting to now).
///
/// Models that persist rows usually start their field list with these.
pub fn base_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("id", FieldType::Uuid)
            .primary_key()
            .default_with(|| Value::Uuid(uuid::Uuid::now_v7())),
        FieldDef::new("created_at", FieldType::DateTime).default_with(now),
        FieldDef::new("updated_at", FieldType::DateTime).default_with(now),
    ]
}

fn now() -> Value {
    Value::from(chrono::Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: &[&str] = &["admin", "member"];

    #[test]
    fn test_field_def_new_defaults() {
        let f = FieldDef::new("name", FieldType::String);
        assert_eq!(f.name, "name");
        assert!(!f.primary_key);
        assert!(!f.null);
        assert!(f.default.is_none());
        assert_eq!(f.index, Constraint::None);
        assert_eq!(f.unique, Constraint::None);
        assert!(!f.is_relation());
    }

    #[test]
    fn test_field_def_builder() {
        let f = FieldDef::new("email", FieldType::String)
            .nullable()
            .unique_group("contact")
            .index();
        assert!(f.null);
        assert_eq!(f.unique, Constraint::Group("contact"));
        assert_eq!(f.index, Constraint::Single);
    }

    #[test]
    fn test_relationship_markers() {
        let f = FieldDef::new("weapons", FieldType::Json).has_many("Weapon");
        assert!(f.is_relation());
        assert_eq!(
            f.relation,
            Some(Relation {
                kind: RelationKind::HasMany,
                to: "Weapon"
            })
        );
        assert_eq!(
            FieldDef::new("squad", FieldType::Uuid)
                .belongs_to("Squad")
                .relation
                .map(|r| r.kind),
            Some(RelationKind::BelongsTo)
        );
    }

    #[test]
    fn test_type_keys_and_categories() {
        assert_eq!(FieldType::Int.type_key(), "int");
        assert_eq!(FieldType::String.type_key(), "str");
        let role = FieldType::StrEnum {
            name: "Role",
            choices: ROLES,
        };
        assert_eq!(role.type_key(), "Role");
        assert_eq!(role.category(), Some(TypeCategory::StrEnum));
        assert_eq!(FieldType::Date.category(), Some(TypeCategory::Temporal));
        assert_eq!(FieldType::DateTime.category(), Some(TypeCategory::Temporal));
        assert_eq!(FieldType::Uuid.category(), None);
    }

    #[test]
    fn test_defaults_produce_values() {
        let fixed = FieldDef::new("level", FieldType::Int).default_value(1);
        assert_eq!(fixed.default.unwrap().produce(), Value::Int(1));

        let fields = base_fields();
        let id = fields[0].default.as_ref().unwrap();
        let (a, b) = (id.produce(), id.produce());
        assert!(matches!(a, Value::Uuid(_)));
        assert_ne!(a, b);
        assert!(fields[0].primary_key);
        assert!(matches!(
            fields[1].default.as_ref().unwrap().produce(),
            Value::DateTime(_)
        ));
    }
}
