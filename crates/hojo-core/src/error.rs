//! Core error types for hojo.
//!
//! [`HojoError`] covers every failure the schema layer, the query layer and the
//! backends can report. [`ConversionError`] and [`ValidationError`] carry the
//! structured detail of schema failures so callers can tell bad external input
//! (validation) apart from a conversion the converter could not perform.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// A raw value could not be structured into, or a typed value could not be
/// unstructured from, a target type.
///
/// # Examples
///
/// ```
/// use hojo_core::error::ConversionError;
///
/// let err = ConversionError::new("int", "expected an integer, got \"thirty\"");
/// assert_eq!(err.to_string(), "cannot convert to int: expected an integer, got \"thirty\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    /// The name of the target type (e.g. "int", "uuid", "Role").
    pub target: String,
    /// What went wrong.
    pub message: String,
}

impl ConversionError {
    /// Creates a new conversion error for the given target type.
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert to {}: {}", self.target, self.message)
    }
}

impl std::error::Error for ConversionError {}

/// Represents a validation error with optional field-level errors.
///
/// Validation errors are raised by `load` when external input does not fit the
/// model. They are either simple (a single message) or compound (per-field
/// error lists).
///
/// # Examples
///
/// ```
/// use hojo_core::error::ValidationError;
///
/// let err = ValidationError::new("This field is required.", "required");
/// assert_eq!(err.to_string(), "This field is required.");
///
/// let mut field_errors = std::collections::BTreeMap::new();
/// field_errors.insert(
///     "age".to_string(),
///     vec![ValidationError::new("Not a valid integer.", "invalid")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// assert_eq!(err.to_string(), "age: Not a valid integer.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: BTreeMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: BTreeMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            field_errors,
        }
    }

    /// Returns the errors recorded for a single field.
    pub fn errors_for(&self, field: &str) -> &[Self] {
        self.field_errors.get(field).map_or(&[], Vec::as_slice)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut first = true;
            for (field, errors) in &self.field_errors {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for hojo.
#[derive(Error, Debug)]
pub enum HojoError {
    // ── Schema ───────────────────────────────────────────────────────

    /// A value could not be converted to or from its declared type.
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// External input failed to load into a model.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // ── Query building ───────────────────────────────────────────────

    /// A filter key used an operator suffix that is not supported.
    #[error("Unsupported lookup filter: {0}")]
    UnsupportedLookup(String),

    /// A lookup was given a value of the wrong shape (e.g. `in` without a list).
    #[error("Invalid value for lookup '{lookup}': {message}")]
    InvalidLookupValue {
        /// The lookup suffix.
        lookup: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A filter, ordering, or update referenced a field the model does not have.
    #[error("Field error: {0}")]
    FieldError(String),

    // ── Connection ───────────────────────────────────────────────────

    /// No database URI could be resolved.
    #[error("Invalid database credentials: {0}")]
    ConnectionCredential(String),

    // ── ORM results ──────────────────────────────────────────────────

    /// `get()` matched no rows.
    #[error("Object does not exist: {0}")]
    NotFound(String),

    /// `get()` matched more than one row.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleResults(String),

    // ── Mapping ──────────────────────────────────────────────────────

    /// A field type has no column mapping.
    #[error("Unsupported type: {field_type} for {model}.{field}")]
    Mapping {
        /// The model name.
        model: String,
        /// The field name.
        field: String,
        /// The field type that could not be mapped.
        field_type: String,
    },

    /// Two index declarations resolved to the same index name. Index names
    /// share one namespace per database schema.
    #[error("Index {index} is declared by both {first} and {second}")]
    DuplicateIndex {
        /// The clashing index name.
        index: String,
        /// The first declaration, as `Model(field, ..)`.
        first: String,
        /// The second declaration, as `Model(field, ..)`.
        second: String,
    },

    // ── Backend ──────────────────────────────────────────────────────

    /// A generic database error.
    #[error("Database error: {0}")]
    Database(String),

    /// A database integrity constraint was violated.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// An operational database error (connection failure, etc.).
    #[error("Operational error: {0}")]
    Operational(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Serialization ────────────────────────────────────────────────

    /// Encoding or decoding text failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HojoError {
    /// Returns `true` for errors caused by bad caller input rather than by the
    /// backend or the environment.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::UnsupportedLookup(_)
                | Self::InvalidLookupValue { .. }
                | Self::FieldError(_)
                | Self::NotFound(_)
        )
    }
}

impl From<serde_json::Error> for HojoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A convenience type alias for `Result<T, HojoError>`.
pub type HojoResult<T> = Result<T, HojoError>;
