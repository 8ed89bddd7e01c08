//! SQL query AST and compiler.
//!
//! This module defines the [`Query`] AST a [`QuerySet`](super::QuerySet)
//! accumulates into, the [`WhereNode`] predicate tree, and the [`SqlCompiler`]
//! that translates both into parameterized SQL. PostgreSQL uses `$1, $2, ...`
//! placeholders; SQLite uses `?`.
//!
//! It also defines [`Row`], the generic result row backends hand back, and
//! the [`FromValue`] conversions models use to read it.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use hojo_core::{ConversionError, HojoError, HojoResult};

use super::expressions::Expression;
use super::lookups::Lookup;
use crate::value::Value;

/// The type of database backend, used by the compiler to generate
/// backend-specific SQL syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackendType {
    /// PostgreSQL (uses `$1, $2, ...` placeholders).
    PostgreSQL,
    /// SQLite (uses `?` placeholders).
    SQLite,
}

/// A column ordering direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The column to order by.
    pub column: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending order.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Creates a descending order.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Parses an ordering key: a leading `-` means descending.
    ///
    /// ```
    /// use hojo_db::query::OrderBy;
    ///
    /// assert_eq!(OrderBy::parse("-level"), OrderBy::desc("level"));
    /// assert_eq!(OrderBy::parse("name"), OrderBy::asc("name"));
    /// ```
    pub fn parse(key: &str) -> Self {
        key.strip_prefix('-')
            .map_or_else(|| Self::asc(key), Self::desc)
    }

    /// The same column in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            column: self.column.clone(),
            descending: !self.descending,
        }
    }
}

/// A WHERE clause node. Only conjunction and per-predicate negation exist.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereNode {
    /// A single condition.
    Condition {
        /// The column name.
        column: String,
        /// The lookup type.
        lookup: Lookup,
    },
    /// Logical AND of conditions.
    And(Vec<WhereNode>),
    /// Logical NOT of a condition.
    Not(Box<WhereNode>),
}

impl fmt::Display for WhereNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condition { column, lookup } => match lookup {
                Lookup::Exact(Value::Null) | Lookup::IsNull(true) => write!(f, "{column} IS NULL"),
                Lookup::IsNull(false) => write!(f, "{column} IS NOT NULL"),
                Lookup::Exact(v) => write!(f, "{column} == {}", v.to_literal()),
                Lookup::Gt(v) => write!(f, "{column} > {}", v.to_literal()),
                Lookup::Gte(v) => write!(f, "{column} >= {}", v.to_literal()),
                Lookup::Lt(v) => write!(f, "{column} < {}", v.to_literal()),
                Lookup::Lte(v) => write!(f, "{column} <= {}", v.to_literal()),
                Lookup::In(vals) => {
                    write!(f, "{column} IN {}", Value::List(vals.clone()).to_literal())
                }
                Lookup::Range(low, high) => write!(
                    f,
                    "{column} BETWEEN {} AND {}",
                    low.to_literal(),
                    high.to_literal()
                ),
                Lookup::Like(p) => write!(f, "{column} LIKE {}", Value::from(p).to_literal()),
                Lookup::ILike(p) => write!(f, "{column} ILIKE {}", Value::from(p).to_literal()),
                Lookup::Contains(s) => {
                    write!(f, "{column} LIKE {}", Value::from(format!("%{s}%")).to_literal())
                }
                Lookup::StartsWith(s) => {
                    write!(f, "{column} LIKE {}", Value::from(format!("{s}%")).to_literal())
                }
                Lookup::EndsWith(s) => {
                    write!(f, "{column} LIKE {}", Value::from(format!("%{s}")).to_literal())
                }
            },
            Self::And(children) => {
                if children.is_empty() {
                    return write!(f, "TRUE");
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " AND ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Self::Not(inner) => write!(f, "NOT({inner})"),
        }
    }
}

/// The query AST representing a SELECT statement.
#[derive(Debug, Clone)]
pub struct Query {
    /// The table name.
    pub table: String,
    /// Columns to select; empty means `*`.
    pub columns: Vec<String>,
    /// WHERE clause.
    pub where_clause: Option<WhereNode>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// DISTINCT flag.
    pub distinct: bool,
    /// Named computed columns, in insertion order.
    pub annotations: Vec<(String, Expression)>,
    /// GROUP BY columns (set when annotations aggregate).
    pub group_by: Vec<String>,
}

impl Query {
    /// Creates a new query for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            where_clause: None,
            order_by: Vec::new(),
            distinct: false,
            annotations: Vec::new(),
            group_by: Vec::new(),
        }
    }
}

/// A generic database row for passing data between backends and the ORM.
///
/// `Row` holds column names and their values in select order, with typed
/// access through [`get`](Row::get).
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or the value cannot be
    /// converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> HojoResult<T> {
        let value = self.get_value(column).ok_or_else(|| {
            HojoError::Database(format!("Column '{column}' not found in row"))
        })?;
        T::from_value(value).map_err(|e| {
            HojoError::Conversion(ConversionError::new(e.target, format!("column '{column}': {}", e.message)))
        })
    }

    /// Gets a typed value by column index.
    pub fn get_by_index<T: FromValue>(&self, idx: usize) -> HojoResult<T> {
        let value = self.values.get(idx).ok_or_else(|| {
            HojoError::Database(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.values.len()
            ))
        })?;
        Ok(T::from_value(value)?)
    }

    /// Returns a reference to the raw Value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Iterates over `(column, value)` pairs in select order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
///
/// SQLite has no native boolean, UUID or temporal storage, so the impls also
/// accept the forms the SQLite backend stores: integers for booleans and text
/// for UUIDs, dates and timestamps.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

fn mismatch(target: &str, value: &Value) -> ConversionError {
    ConversionError::new(target, format!("unexpected {} value {value}", value.kind()))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(mismatch("int", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(i) => Self::try_from(*i)
                .map_err(|e| ConversionError::new("int", format!("out of i32 range: {e}"))),
            _ => Err(mismatch("int", value)),
        }
    }
}

impl FromValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mismatch("str", value)),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Uuid(u) => Ok(*u),
            Value::String(s) => {
                Self::parse_str(s).map_err(|e| ConversionError::new("uuid", e.to_string()))
            }
            _ => Err(mismatch("uuid", value)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::String(s) => Self::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| ConversionError::new("date", e.to_string())),
            _ => Err(mismatch("date", value)),
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::String(s) => Self::parse_from_rfc3339(s)
                .map_err(|e| ConversionError::new("datetime", e.to_string())),
            _ => Err(mismatch("datetime", value)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            Value::String(s) => {
                serde_json::from_str(s).map_err(|e| ConversionError::new("json", e.to_string()))
            }
            _ => Err(mismatch("json", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}

/// The SQL compiler translates a [`Query`] AST into parameterized SQL.
pub struct SqlCompiler {
    backend: DatabaseBackendType,
}

impl SqlCompiler {
    /// Creates a new compiler for the given backend type.
    pub const fn new(backend: DatabaseBackendType) -> Self {
        Self { backend }
    }

    /// Returns a parameter placeholder for the given 1-based index.
    pub(crate) fn placeholder(&self, index: usize) -> String {
        match self.backend {
            DatabaseBackendType::PostgreSQL => format!("${index}"),
            DatabaseBackendType::SQLite => "?".to_string(),
        }
    }

    fn push_param(&self, params: &mut Vec<Value>, value: Value) -> String {
        params.push(value);
        self.placeholder(params.len())
    }

    /// Compiles a SELECT query into SQL and parameters.
    pub fn compile_select(&self, query: &Query) -> (String, Vec<Value>) {
        let mut params: Vec<Value> = Vec::new();
        let mut sql = String::from("SELECT ");

        if query.distinct {
            sql.push_str("DISTINCT ");
        }

        let mut select_parts: Vec<String> = if query.columns.is_empty() {
            vec![format!("\"{}\".*", query.table)]
        } else {
            query.columns.iter().map(|c| format!("\"{c}\"")).collect()
        };
        for (alias, expr) in &query.annotations {
            let expr_sql = self.compile_expression(expr, &mut params);
            select_parts.push(format!("{expr_sql} AS \"{alias}\""));
        }
        sql.push_str(&select_parts.join(", "));

        sql.push_str(&format!(" FROM \"{}\"", query.table));
        self.push_where(query.where_clause.as_ref(), &mut sql, &mut params);

        if !query.group_by.is_empty() {
            let cols: Vec<String> = query.group_by.iter().map(|c| format!("\"{c}\"")).collect();
            sql.push_str(&format!(" GROUP BY {}", cols.join(", ")));
        }

        if !query.order_by.is_empty() {
            let orders: Vec<String> = query
                .order_by
                .iter()
                .map(|o| {
                    let dir = if o.descending { " DESC" } else { " ASC" };
                    format!("\"{}\"{dir}", o.column)
                })
                .collect();
            sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
        }

        (sql, params)
    }

    /// Compiles `SELECT COUNT(*)` over the query's rows.
    pub fn compile_count(&self, query: &Query) -> (String, Vec<Value>) {
        if query.distinct || !query.group_by.is_empty() {
            let mut inner = query.clone();
            inner.order_by.clear();
            let (inner_sql, params) = self.compile_select(&inner);
            return (
                format!("SELECT COUNT(*) AS \"__count\" FROM ({inner_sql}) AS \"__sub\""),
                params,
            );
        }
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) AS \"__count\" FROM \"{}\"", query.table);
        self.push_where(query.where_clause.as_ref(), &mut sql, &mut params);
        (sql, params)
    }

    /// Compiles a query returning one row of named aggregates.
    pub fn compile_aggregate(
        &self,
        query: &Query,
        aggregates: &[(String, Expression)],
    ) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let parts: Vec<String> = aggregates
            .iter()
            .map(|(alias, expr)| {
                let expr_sql = self.compile_expression(expr, &mut params);
                format!("{expr_sql} AS \"{alias}\"")
            })
            .collect();
        let mut sql = format!("SELECT {} FROM \"{}\"", parts.join(", "), query.table);
        self.push_where(query.where_clause.as_ref(), &mut sql, &mut params);
        (sql, params)
    }

    /// Compiles an INSERT statement.
    pub fn compile_insert(&self, table: &str, fields: &[(&str, Value)]) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let columns: Vec<String> = fields.iter().map(|(name, _)| format!("\"{name}\"")).collect();
        let placeholders: Vec<String> = fields
            .iter()
            .map(|(_, val)| self.push_param(&mut params, val.clone()))
            .collect();

        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );

        (sql, params)
    }

    /// Compiles an UPDATE statement over the given condition.
    pub fn compile_update(
        &self,
        table: &str,
        fields: &[(&str, Value)],
        where_clause: Option<&WhereNode>,
    ) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let set_parts: Vec<String> = fields
            .iter()
            .map(|(name, val)| {
                let ph = self.push_param(&mut params, val.clone());
                format!("\"{name}\" = {ph}")
            })
            .collect();

        let mut sql = format!("UPDATE \"{}\" SET {}", table, set_parts.join(", "));
        self.push_where(where_clause, &mut sql, &mut params);

        (sql, params)
    }

    /// Compiles a DELETE statement over the given condition.
    pub fn compile_delete(&self, table: &str, where_clause: Option<&WhereNode>) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM \"{table}\"");
        self.push_where(where_clause, &mut sql, &mut params);
        (sql, params)
    }

    fn push_where(&self, where_clause: Option<&WhereNode>, sql: &mut String, params: &mut Vec<Value>) {
        match where_clause {
            Some(WhereNode::And(children)) if children.is_empty() => {}
            Some(node) => {
                sql.push_str(" WHERE ");
                self.compile_where_node(node, sql, params);
            }
            None => {}
        }
    }

    /// Compiles a `WhereNode` into SQL, appending to the provided string.
    pub(crate) fn compile_where_node(&self, node: &WhereNode, sql: &mut String, params: &mut Vec<Value>) {
        match node {
            WhereNode::Condition { column, lookup } => {
                self.compile_lookup(column, lookup, sql, params);
            }
            WhereNode::And(children) => {
                if children.is_empty() {
                    sql.push_str("1=1");
                    return;
                }
                sql.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" AND ");
                    }
                    self.compile_where_node(child, sql, params);
                }
                sql.push(')');
            }
            WhereNode::Not(inner) => {
                sql.push_str("NOT (");
                self.compile_where_node(inner, sql, params);
                sql.push(')');
            }
        }
    }

    fn compile_binary_lookup(&self, column: &str, op: &str, val: &Value, sql: &mut String, params: &mut Vec<Value>) {
        let ph = self.push_param(params, val.clone());
        sql.push_str(&format!("\"{column}\" {op} {ph}"));
    }

    fn compile_like(&self, column: &str, pattern: String, case_insensitive: bool, sql: &mut String, params: &mut Vec<Value>) {
        let ph = self.push_param(params, Value::String(pattern));
        match (case_insensitive, self.backend) {
            (false, _) => sql.push_str(&format!("\"{column}\" LIKE {ph}")),
            (true, DatabaseBackendType::PostgreSQL) => {
                sql.push_str(&format!("\"{column}\" ILIKE {ph}"));
            }
            (true, DatabaseBackendType::SQLite) => {
                sql.push_str(&format!("LOWER(\"{column}\") LIKE LOWER({ph})"));
            }
        }
    }

    /// Compiles a single lookup into SQL.
    fn compile_lookup(&self, column: &str, lookup: &Lookup, sql: &mut String, params: &mut Vec<Value>) {
        match lookup {
            Lookup::Exact(Value::Null) | Lookup::IsNull(true) => {
                sql.push_str(&format!("\"{column}\" IS NULL"));
            }
            Lookup::IsNull(false) => sql.push_str(&format!("\"{column}\" IS NOT NULL")),
            Lookup::Exact(val) => self.compile_binary_lookup(column, "=", val, sql, params),
            Lookup::Gt(val) => self.compile_binary_lookup(column, ">", val, sql, params),
            Lookup::Gte(val) => self.compile_binary_lookup(column, ">=", val, sql, params),
            Lookup::Lt(val) => self.compile_binary_lookup(column, "<", val, sql, params),
            Lookup::Lte(val) => self.compile_binary_lookup(column, "<=", val, sql, params),
            Lookup::In(vals) => {
                if vals.is_empty() {
                    sql.push_str("1=0");
                    return;
                }
                let placeholders: Vec<String> = vals
                    .iter()
                    .map(|v| self.push_param(params, v.clone()))
                    .collect();
                sql.push_str(&format!("\"{column}\" IN ({})", placeholders.join(", ")));
            }
            Lookup::Range(low, high) => {
                let ph_low = self.push_param(params, low.clone());
                let ph_high = self.push_param(params, high.clone());
                sql.push_str(&format!("\"{column}\" BETWEEN {ph_low} AND {ph_high}"));
            }
            Lookup::Like(p) => self.compile_like(column, p.clone(), false, sql, params),
            Lookup::ILike(p) => self.compile_like(column, p.clone(), true, sql, params),
            Lookup::Contains(s) => self.compile_like(column, format!("%{s}%"), false, sql, params),
            Lookup::StartsWith(s) => self.compile_like(column, format!("{s}%"), false, sql, params),
            Lookup::EndsWith(s) => self.compile_like(column, format!("%{s}"), false, sql, params),
        }
    }

    /// Compiles an expression into SQL.
    pub(crate) fn compile_expression(&self, expr: &Expression, params: &mut Vec<Value>) -> String {
        match expr {
            Expression::F(name) => format!("\"{name}\""),
            Expression::Value(val) => self.push_param(params, val.clone()),
            Expression::Aggregate {
                func,
                field,
                distinct,
            } => {
                let field_sql = self.compile_expression(field, params);
                let distinct_str = if *distinct { "DISTINCT " } else { "" };
                format!("{}({distinct_str}{field_sql})", func.sql_name())
            }
            Expression::Add(left, right) => self.compile_binary("+", left, right, params),
            Expression::Sub(left, right) => self.compile_binary("-", left, right, params),
            Expression::Mul(left, right) => self.compile_binary("*", left, right, params),
            Expression::Div(left, right) => self.compile_binary("/", left, right, params),
        }
    }

    fn compile_binary(&self, op: &str, left: &Expression, right: &Expression, params: &mut Vec<Value>) -> String {
        let l = self.compile_expression(left, params);
        let r = self.compile_expression(right, params);
        format!("({l} {op} {r})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::lookups::LookupFilter;

    fn pg() -> SqlCompiler {
        SqlCompiler::new(DatabaseBackendType::PostgreSQL)
    }

    fn sqlite() -> SqlCompiler {
        SqlCompiler::new(DatabaseBackendType::SQLite)
    }

    fn and(filters: &[LookupFilter]) -> WhereNode {
        WhereNode::And(filters.iter().map(LookupFilter::to_predicate).collect())
    }

    // ── Row ──────────────────────────────────────────────────────────

    #[test]
    fn test_row_typed_access() {
        let row = Row::new(
            vec!["name".into(), "age".into(), "active".into()],
            vec![Value::from("Cloud"), Value::Int(21), Value::Int(1)],
        );
        assert_eq!(row.get::<String>("name").unwrap(), "Cloud");
        assert_eq!(row.get::<i64>("age").unwrap(), 21);
        assert!(row.get::<bool>("active").unwrap());
        assert_eq!(row.get_by_index::<i32>(1).unwrap(), 21);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_row_missing_column() {
        let row = Row::new(vec!["id".into()], vec![Value::Int(1)]);
        assert!(matches!(row.get::<i64>("nope"), Err(HojoError::Database(_))));
        assert!(row.get_by_index::<i64>(3).is_err());
    }

    #[test]
    fn test_row_type_mismatch_is_conversion_error() {
        let row = Row::new(vec!["age".into()], vec![Value::from("x")]);
        assert!(matches!(row.get::<i64>("age"), Err(HojoError::Conversion(_))));
    }

    #[test]
    fn test_row_text_fallbacks() {
        let row = Row::new(
            vec!["id".into(), "born".into(), "at".into()],
            vec![
                Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8"),
                Value::from("1997-01-31"),
                Value::from("2024-01-15T12:30:00+02:00"),
            ],
        );
        assert!(row.get::<uuid::Uuid>("id").is_ok());
        assert_eq!(
            row.get::<NaiveDate>("born").unwrap(),
            NaiveDate::from_ymd_opt(1997, 1, 31).unwrap()
        );
        assert_eq!(
            row.get::<DateTime<FixedOffset>>("at").unwrap().offset().local_minus_utc(),
            7200
        );
    }

    #[test]
    fn test_row_optional() {
        let row = Row::new(vec!["age".into()], vec![Value::Null]);
        assert_eq!(row.get::<Option<i64>>("age").unwrap(), None);
    }

    // ── SELECT ───────────────────────────────────────────────────────

    #[test]
    fn test_select_all() {
        let (sql, params) = sqlite().compile_select(&Query::new("users"));
        assert_eq!(sql, "SELECT \"users\".* FROM \"users\"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_select_with_conjunction_and_negation() {
        let mut q = Query::new("users");
        q.where_clause = Some(and(&[
            LookupFilter::parse("name", "Sephiroth").unwrap(),
            LookupFilter::parse("age__gt", 10).unwrap().negate(),
        ]));
        let (sql, params) = pg().compile_select(&q);
        assert_eq!(
            sql,
            "SELECT \"users\".* FROM \"users\" WHERE (\"name\" = $1 AND NOT (\"age\" > $2))"
        );
        assert_eq!(params, vec![Value::from("Sephiroth"), Value::Int(10)]);
    }

    #[test]
    fn test_select_order_and_distinct() {
        let mut q = Query::new("users");
        q.distinct = true;
        q.order_by = vec![OrderBy::parse("-age"), OrderBy::parse("name")];
        let (sql, _) = sqlite().compile_select(&q);
        assert_eq!(
            sql,
            "SELECT DISTINCT \"users\".* FROM \"users\" ORDER BY \"age\" DESC, \"name\" ASC"
        );
    }

    #[test]
    fn test_select_columns_and_annotations() {
        let mut q = Query::new("soldiers");
        q.columns = vec!["name".into()];
        q.annotations = vec![("double".into(), Expression::f("level") * Expression::value(2))];
        let (sql, params) = pg().compile_select(&q);
        assert_eq!(
            sql,
            "SELECT \"name\", (\"level\" * $1) AS \"double\" FROM \"soldiers\""
        );
        assert_eq!(params, vec![Value::Int(2)]);
    }

    #[test]
    fn test_lookup_sql() {
        let cases: Vec<(LookupFilter, &str)> = vec![
            (LookupFilter::parse("age__in", vec![1, 2]).unwrap(), "\"age\" IN ($1, $2)"),
            (LookupFilter::parse("age__between", vec![1, 5]).unwrap(), "\"age\" BETWEEN $1 AND $2"),
            (LookupFilter::parse("age__isnull", true).unwrap(), "\"age\" IS NULL"),
            (LookupFilter::parse("age__lte", 3).unwrap(), "\"age\" <= $1"),
            (LookupFilter::parse("name__contains", "lo").unwrap(), "\"name\" LIKE $1"),
            (LookupFilter::parse("name__ilike", "c%").unwrap(), "\"name\" ILIKE $1"),
            (LookupFilter::parse("age__in", Vec::<i64>::new()).unwrap(), "1=0"),
        ];
        for (filter, expected) in cases {
            let mut sql = String::new();
            let mut params = Vec::new();
            pg().compile_where_node(&filter.to_predicate(), &mut sql, &mut params);
            assert_eq!(sql, expected);
        }
    }

    #[test]
    fn test_pattern_params() {
        let mut params = Vec::new();
        let mut sql = String::new();
        let f = LookupFilter::parse("name__startswith", "Cl").unwrap();
        sqlite().compile_where_node(&f.to_predicate(), &mut sql, &mut params);
        assert_eq!(params, vec![Value::from("Cl%")]);

        let mut sql = String::new();
        let f = LookupFilter::parse("name__ilike", "CL%").unwrap();
        sqlite().compile_where_node(&f.to_predicate(), &mut sql, &mut params);
        assert_eq!(sql, "LOWER(\"name\") LIKE LOWER(?)");
    }

    // ── COUNT / aggregate ────────────────────────────────────────────

    #[test]
    fn test_count() {
        let mut q = Query::new("users");
        q.where_clause = Some(and(&[LookupFilter::parse("age__gt", 1).unwrap()]));
        let (sql, params) = sqlite().compile_count(&q);
        assert_eq!(
            sql,
            "SELECT COUNT(*) AS \"__count\" FROM \"users\" WHERE (\"age\" > ?)"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_count_distinct_wraps() {
        let mut q = Query::new("users");
        q.distinct = true;
        q.order_by = vec![OrderBy::asc("name")];
        let (sql, _) = sqlite().compile_count(&q);
        assert_eq!(
            sql,
            "SELECT COUNT(*) AS \"__count\" FROM (SELECT DISTINCT \"users\".* FROM \"users\") AS \"__sub\""
        );
    }

    #[test]
    fn test_aggregate() {
        let q = Query::new("soldiers");
        let (sql, _) = pg().compile_aggregate(
            &q,
            &[
                ("total".into(), Expression::sum("level")),
                ("n".into(), Expression::count("id")),
            ],
        );
        assert_eq!(
            sql,
            "SELECT SUM(\"level\") AS \"total\", COUNT(\"id\") AS \"n\" FROM \"soldiers\""
        );
    }

    // ── INSERT / UPDATE / DELETE ─────────────────────────────────────

    #[test]
    fn test_insert() {
        let (sql, params) =
            pg().compile_insert("users", &[("name", Value::from("Tifa")), ("age", Value::Int(20))]);
        assert_eq!(sql, "INSERT INTO \"users\" (\"name\", \"age\") VALUES ($1, $2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_update_numbers_params_after_set() {
        let w = and(&[LookupFilter::parse("name", "Tifa").unwrap()]);
        let (sql, params) = pg().compile_update("users", &[("age", Value::Int(21))], Some(&w));
        assert_eq!(sql, "UPDATE \"users\" SET \"age\" = $1 WHERE (\"name\" = $2)");
        assert_eq!(params, vec![Value::Int(21), Value::from("Tifa")]);
    }

    #[test]
    fn test_delete_without_filters_has_no_where() {
        let (sql, params) = sqlite().compile_delete("users", Some(&WhereNode::And(vec![])));
        assert_eq!(sql, "DELETE FROM \"users\"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_where_display() {
        let node = and(&[
            LookupFilter::parse("name", "Sephiroth").unwrap(),
            LookupFilter::parse("age__gt", 10).unwrap().negate(),
        ]);
        assert_eq!(node.to_string(), "name == 'Sephiroth' AND NOT(age > 10)");
        assert_eq!(WhereNode::And(vec![]).to_string(), "TRUE");
    }
}
