//! Field definitions and types for the ORM.
//!
//! This module provides the [`FieldDef`] struct and [`FieldType`] enum that
//! describe model fields, their conversion types, and their column metadata.

pub mod types;

pub use types::{
    base_fields, Constraint, FieldDef, FieldDefault, FieldType, Relation, RelationKind,
    TypeCategory,
};
