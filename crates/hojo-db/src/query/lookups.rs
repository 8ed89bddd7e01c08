//! The lookup filter grammar.
//!
//! Filter keys have the form `field` or `field__operator`. The key is split on
//! the first [`LOOKUP_SEPARATOR`]; a bare field name means `eq`. Every filter
//! becomes a [`LookupFilter`], and each filter compiles to exactly one
//! predicate. Predicates are only ever ANDed together; `exclude` negates its
//! own predicate and nothing else.
//!
//! # Examples
//!
//! ```
//! use hojo_db::query::lookups::{LookupFilter, LookupKind};
//!
//! let f = LookupFilter::parse("age__gt", 30).unwrap();
//! assert_eq!(f.field_name, "age");
//! assert_eq!(f.lookup, LookupKind::Gt);
//! assert!(!f.exclude);
//! assert_eq!(f.to_predicate().to_string(), "age > 30");
//! assert_eq!(f.negate().to_predicate().to_string(), "NOT(age > 30)");
//! ```

use std::fmt;
use std::str::FromStr;

use hojo_core::{HojoError, HojoResult};

use crate::query::compiler::WhereNode;
use crate::value::Value;

/// Separates the field name from the operator in a filter key.
pub const LOOKUP_SEPARATOR: &str = "__";

/// The supported lookup operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// `field == value` (`field IS NULL` for a null value).
    Eq,
    /// `field > value`.
    Gt,
    /// `field >= value`.
    Gte,
    /// `field < value`.
    Lt,
    /// `field <= value`.
    Lte,
    /// Membership in a list.
    In,
    /// `IS NULL` when true, `IS NOT NULL` when false.
    IsNull,
    /// Inclusive range over a two-element list.
    Between,
    /// SQL `LIKE` with a caller-supplied pattern.
    Like,
    /// Case-insensitive `LIKE`.
    ILike,
    /// Substring match.
    Contains,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
}

impl LookupKind {
    /// All lookups, in grammar order.
    pub const ALL: [Self; 13] = [
        Self::Eq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::IsNull,
        Self::Between,
        Self::Like,
        Self::ILike,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
    ];

    /// The operator suffix as written in filter keys.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::IsNull => "isnull",
            Self::Between => "between",
            Self::Like => "like",
            Self::ILike => "ilike",
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupKind {
    type Err = HojoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| HojoError::UnsupportedLookup(s.to_string()))
    }
}

/// A field-level comparison with its operand, ready for compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Equality; a null operand compiles to `IS NULL`.
    Exact(Value),
    /// Greater than.
    Gt(Value),
    /// Greater than or equal.
    Gte(Value),
    /// Less than.
    Lt(Value),
    /// Less than or equal.
    Lte(Value),
    /// Membership.
    In(Vec<Value>),
    /// Null test.
    IsNull(bool),
    /// Inclusive range.
    Range(Value, Value),
    /// Raw `LIKE` pattern.
    Like(String),
    /// Raw case-insensitive `LIKE` pattern.
    ILike(String),
    /// Substring.
    Contains(String),
    /// Prefix.
    StartsWith(String),
    /// Suffix.
    EndsWith(String),
}

/// One accumulated filter: a field, an operator, an operand and whether the
/// predicate is negated.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupFilter {
    /// The field being compared.
    pub field_name: String,
    /// The operator.
    pub lookup: LookupKind,
    /// The operand as supplied.
    pub value: Value,
    /// Whether the predicate is negated.
    pub exclude: bool,
    condition: Lookup,
}

impl LookupFilter {
    /// Builds a filter from an explicit operator, checking the operand shape.
    ///
    /// `in` needs a list, `between` a two-element list, `isnull` a boolean and
    /// the pattern lookups text. Ordering comparisons reject null and lists.
    pub fn new(field_name: impl Into<String>, lookup: LookupKind, value: impl Into<Value>) -> HojoResult<Self> {
        let value = value.into();
        let condition = build_lookup(lookup, &value)?;
        Ok(Self {
            field_name: field_name.into(),
            lookup,
            value,
            exclude: false,
            condition,
        })
    }

    /// Parses a `field__operator` key.
    ///
    /// Fails with [`HojoError::UnsupportedLookup`] naming the suffix when the
    /// operator is unknown.
    pub fn parse(key: &str, value: impl Into<Value>) -> HojoResult<Self> {
        let (field_name, lookup) = match key.split_once(LOOKUP_SEPARATOR) {
            Some((field, suffix)) => (field, suffix.parse::<LookupKind>()?),
            None => (key, LookupKind::Eq),
        };
        if field_name.is_empty() {
            return Err(HojoError::FieldError(format!(
                "filter key '{key}' has no field name"
            )));
        }
        Self::new(field_name, lookup, value)
    }

    /// Returns the negated form of this filter.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            exclude: !self.exclude,
            ..self.clone()
        }
    }

    /// The comparison this filter compiles to, without negation.
    pub const fn condition(&self) -> &Lookup {
        &self.condition
    }

    /// Compiles this filter into its predicate.
    pub fn to_predicate(&self) -> WhereNode {
        let node = WhereNode::Condition {
            column: self.field_name.clone(),
            lookup: self.condition.clone(),
        };
        if self.exclude {
            WhereNode::Not(Box::new(node))
        } else {
            node
        }
    }
}

fn invalid(lookup: LookupKind, message: impl Into<String>) -> HojoError {
    HojoError::InvalidLookupValue {
        lookup: lookup.as_str().to_string(),
        message: message.into(),
    }
}

fn build_lookup(kind: LookupKind, value: &Value) -> HojoResult<Lookup> {
    let scalar = |wrap: fn(Value) -> Lookup| match value {
        Value::List(_) => Err(invalid(kind, "expected a single value, got a list")),
        Value::Null if kind != LookupKind::Eq => {
            Err(invalid(kind, "cannot compare with null; use isnull"))
        }
        v => Ok(wrap(v.clone())),
    };
    let text = |wrap: fn(String) -> Lookup| match value {
        Value::String(s) => Ok(wrap(s.clone())),
        other => Err(invalid(kind, format!("expected text, got {}", other.kind()))),
    };

    match kind {
        LookupKind::Eq => scalar(Lookup::Exact),
        LookupKind::Gt => scalar(Lookup::Gt),
        LookupKind::Gte => scalar(Lookup::Gte),
        LookupKind::Lt => scalar(Lookup::Lt),
        LookupKind::Lte => scalar(Lookup::Lte),
        LookupKind::In => match value {
            Value::List(items) => Ok(Lookup::In(items.clone())),
            other => Err(invalid(kind, format!("expected a list, got {}", other.kind()))),
        },
        LookupKind::Between => match value.as_list() {
            Some([low, high]) => Ok(Lookup::Range(low.clone(), high.clone())),
            _ => Err(invalid(kind, "expected a list of exactly two values")),
        },
        LookupKind::IsNull => value
            .as_bool()
            .map(Lookup::IsNull)
            .ok_or_else(|| invalid(kind, format!("expected a boolean, got {}", value.kind()))),
        LookupKind::Like => text(Lookup::Like),
        LookupKind::ILike => text(Lookup::ILike),
        LookupKind::Contains => text(Lookup::Contains),
        LookupKind::StartsWith => text(Lookup::StartsWith),
        LookupKind::EndsWith => text(Lookup::EndsWith),
    }
}
