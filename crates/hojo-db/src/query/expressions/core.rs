//! Column references, literals, aggregates, and arithmetic.
//!
//! # Examples
//!
//! ```
//! use hojo_db::query::expressions::{Expression, AggregateFunc};
//!
//! // level * 2
//! let doubled = Expression::f("level") * Expression::value(2);
//!
//! // Avg("level")
//! let avg = Expression::aggregate(AggregateFunc::Avg, Expression::f("level"));
//! assert!(avg.contains_aggregate());
//! assert!(!doubled.contains_aggregate());
//! ```

use std::ops;

use crate::value::Value;

/// A computed value used by `annotate()` and `aggregate()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A reference to a model field.
    F(String),
    /// A literal value, bound as a parameter.
    Value(Value),
    /// An aggregate function.
    Aggregate {
        /// The aggregate operation.
        func: AggregateFunc,
        /// The expression being aggregated.
        field: Box<Expression>,
        /// Whether to apply DISTINCT.
        distinct: bool,
    },
    /// Addition.
    Add(Box<Expression>, Box<Expression>),
    /// Subtraction.
    Sub(Box<Expression>, Box<Expression>),
    /// Multiplication.
    Mul(Box<Expression>, Box<Expression>),
    /// Division.
    Div(Box<Expression>, Box<Expression>),
}

/// Aggregate function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    /// COUNT.
    Count,
    /// SUM.
    Sum,
    /// AVG.
    Avg,
    /// MIN.
    Min,
    /// MAX.
    Max,
}

impl AggregateFunc {
    /// Returns the SQL function name for this aggregate.
    pub const fn sql_name(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

impl Expression {
    /// Creates a field reference.
    pub fn f(name: impl Into<String>) -> Self {
        Self::F(name.into())
    }

    /// Creates a literal value expression.
    pub fn value(v: impl Into<Value>) -> Self {
        Self::Value(v.into())
    }

    /// Creates an aggregate expression.
    pub fn aggregate(func: AggregateFunc, field: Expression) -> Self {
        Self::Aggregate {
            func,
            field: Box::new(field),
            distinct: false,
        }
    }

    /// Creates an aggregate with DISTINCT.
    pub fn aggregate_distinct(func: AggregateFunc, field: Expression) -> Self {
        Self::Aggregate {
            func,
            field: Box::new(field),
            distinct: true,
        }
    }

    /// `COUNT(field)`.
    pub fn count(field: &str) -> Self {
        Self::aggregate(AggregateFunc::Count, Self::f(field))
    }

    /// `SUM(field)`.
    pub fn sum(field: &str) -> Self {
        Self::aggregate(AggregateFunc::Sum, Self::f(field))
    }

    /// `AVG(field)`.
    pub fn avg(field: &str) -> Self {
        Self::aggregate(AggregateFunc::Avg, Self::f(field))
    }

    /// `MIN(field)`.
    pub fn min(field: &str) -> Self {
        Self::aggregate(AggregateFunc::Min, Self::f(field))
    }

    /// `MAX(field)`.
    pub fn max(field: &str) -> Self {
        Self::aggregate(AggregateFunc::Max, Self::f(field))
    }

    /// Returns `true` if an aggregate appears anywhere in the expression.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Self::Aggregate { .. } => true,
            Self::F(_) | Self::Value(_) => false,
            Self::Add(l, r) | Self::Sub(l, r) | Self::Mul(l, r) | Self::Div(l, r) => {
                l.contains_aggregate() || r.contains_aggregate()
            }
        }
    }

    /// Every field name the expression references.
    pub fn referenced_fields(&self) -> Vec<&str> {
        match self {
            Self::F(name) => vec![name.as_str()],
            Self::Value(_) => Vec::new(),
            Self::Aggregate { field, .. } => field.referenced_fields(),
            Self::Add(l, r) | Self::Sub(l, r) | Self::Mul(l, r) | Self::Div(l, r) => {
                let mut names = l.referenced_fields();
                names.extend(r.referenced_fields());
                names
            }
        }
    }
}

impl ops::Add for Expression {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::Add(Box::new(self), Box::new(rhs))
    }
}

impl ops::Sub for Expression {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::Sub(Box::new(self), Box::new(rhs))
    }
}

impl ops::Mul for Expression {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self::Mul(Box::new(self), Box::new(rhs))
    }
}

impl ops::Div for Expression {
    type Output = Self;
    fn div(self, rhs: Self) -> Self::Output {
        Self::Div(Box::new(self), Box::new(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_expression() {
        let expr = Expression::value(42);
        assert!(matches!(expr, Expression::Value(Value::Int(42))));
    }

    #[test]
    fn test_aggregate_helpers() {
        assert_eq!(
            Expression::count("id"),
            Expression::aggregate(AggregateFunc::Count, Expression::f("id"))
        );
        match Expression::aggregate_distinct(AggregateFunc::Count, Expression::f("weapon")) {
            Expression::Aggregate { distinct, .. } => assert!(distinct),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_arithmetic_operators() {
        assert!(matches!(Expression::f("a") + Expression::value(1), Expression::Add(_, _)));
        assert!(matches!(Expression::f("a") - Expression::value(1), Expression::Sub(_, _)));
        assert!(matches!(Expression::f("a") * Expression::f("b"), Expression::Mul(_, _)));
        assert!(matches!(Expression::f("a") / Expression::value(2), Expression::Div(_, _)));
    }

    #[test]
    fn test_referenced_fields() {
        let expr = (Expression::f("level") * Expression::f("hp")) - Expression::value(1);
        assert_eq!(expr.referenced_fields(), vec!["level", "hp"]);
        assert!(Expression::value(1).referenced_fields().is_empty());
    }

    #[test]
    fn test_contains_aggregate() {
        assert!((Expression::sum("hp") / Expression::value(2)).contains_aggregate());
        assert!(!Expression::f("hp").contains_aggregate());
    }

    #[test]
    fn test_aggregate_func_sql_names() {
        assert_eq!(AggregateFunc::Count.sql_name(), "COUNT");
        assert_eq!(AggregateFunc::Sum.sql_name(), "SUM");
        assert_eq!(AggregateFunc::Avg.sql_name(), "AVG");
        assert_eq!(AggregateFunc::Min.sql_name(), "MIN");
        assert_eq!(AggregateFunc::Max.sql_name(), "MAX");
    }
}
