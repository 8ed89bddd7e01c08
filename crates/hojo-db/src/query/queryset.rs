//! QuerySet and Manager for building and executing database queries.
//!
//! A [`QuerySet`] is a lazy, immutable accumulator of filter, ordering and
//! annotation intent. Every builder call returns a new QuerySet and leaves
//! the receiver untouched. The first data access (`fetch`, `len`,
//! `is_empty`, `first`, `last`) compiles the accumulated filters into one
//! conjunction, runs exactly one statement, and caches the result for the
//! lifetime of that QuerySet.
//!
//! The [`Manager`] is the per-model entry point returned by
//! [`Model::objects`](crate::model::Model::objects); it binds each fresh
//! QuerySet to a session.
//!
//! # Examples
//!
//! ```ignore
//! let qs = User::objects().filter("name", "Sephiroth")?.exclude("age__gt", 10)?;
//! assert_eq!(qs.compile_conditions().to_string(), "name == 'Sephiroth' AND NOT(age > 10)");
//! let users = qs.fetch().await?;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use hojo_core::logging::unit_of_work_span;
use hojo_core::{HojoError, HojoResult};
use serde_json::Value as JsonValue;
use tokio::sync::OnceCell;
use tracing::Instrument;

use super::bulk::{compile_bulk_insert, compile_bulk_update};
use super::compiler::{OrderBy, Query, Row, SqlCompiler, WhereNode};
use super::expressions::Expression;
use super::lookups::LookupFilter;
use crate::converter::Converter;
use crate::executor::{default_session, Session};
use crate::model::Model;
use crate::schema::Schema;
use crate::value::Value;

/// A lazy query over the rows of model `M`.
pub struct QuerySet<M: Model> {
    session: Arc<dyn Session>,
    filters: Vec<LookupFilter>,
    ordering: Vec<OrderBy>,
    distinct: bool,
    annotations: Vec<(String, Expression)>,
    cache: OnceCell<Vec<M>>,
    _model: PhantomData<M>,
}

/// Cloning keeps the accumulated intent and drops the cache.
impl<M: Model> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            filters: self.filters.clone(),
            ordering: self.ordering.clone(),
            distinct: self.distinct,
            annotations: self.annotations.clone(),
            cache: OnceCell::new(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for QuerySet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("model", &M::meta().name)
            .field("filters", &self.filters)
            .field("ordering", &self.ordering)
            .field("distinct", &self.distinct)
            .field("executed", &self.is_executed())
            .finish_non_exhaustive()
    }
}

impl<M: Model> QuerySet<M> {
    /// Creates an unfiltered QuerySet bound to `session`.
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            filters: Vec::new(),
            ordering: Vec::new(),
            distinct: false,
            annotations: Vec::new(),
            cache: OnceCell::new(),
            _model: PhantomData,
        }
    }

    // ── Building ─────────────────────────────────────────────────────

    /// Returns a copy of this QuerySet with an empty cache.
    #[must_use]
    pub fn all(&self) -> Self {
        self.clone()
    }

    /// Adds a `field__operator` filter.
    ///
    /// Fails with `UnsupportedLookup` for an unknown operator and with
    /// `FieldError` when the field is not a column of the model.
    pub fn filter(&self, key: &str, value: impl Into<Value>) -> HojoResult<Self> {
        self.filter_lookup(LookupFilter::parse(key, value)?)
    }

    /// Adds an already built filter.
    pub fn filter_lookup(&self, filter: LookupFilter) -> HojoResult<Self> {
        self.check_column(&filter.field_name)?;
        let mut qs = self.clone();
        qs.filters.push(filter);
        Ok(qs)
    }

    /// Adds several filters, in order.
    pub fn filter_all<I, K, V>(&self, filters: I) -> HojoResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        filters
            .into_iter()
            .try_fold(self.clone(), |qs, (key, value)| qs.filter(key.as_ref(), value))
    }

    /// Adds a negated `field__operator` filter. Only this predicate is negated.
    pub fn exclude(&self, key: &str, value: impl Into<Value>) -> HojoResult<Self> {
        self.filter_lookup(LookupFilter::parse(key, value)?.negate())
    }

    /// Adds an already built filter, negated.
    pub fn exclude_lookup(&self, filter: LookupFilter) -> HojoResult<Self> {
        self.filter_lookup(filter.negate())
    }

    /// Appends orderings; a leading `-` sorts descending.
    pub fn order_by(&self, fields: &[&str]) -> HojoResult<Self> {
        let mut qs = self.clone();
        for key in fields {
            let order = OrderBy::parse(key);
            if !self.is_annotation(&order.column) {
                self.check_column(&order.column)?;
            }
            qs.ordering.push(order);
        }
        Ok(qs)
    }

    /// Flips the direction of every ordering. Unordered QuerySets are
    /// returned unchanged.
    #[must_use]
    pub fn reverse(&self) -> Self {
        let mut qs = self.clone();
        qs.ordering = self.ordering.iter().map(OrderBy::reversed).collect();
        qs
    }

    /// Removes duplicate rows.
    #[must_use]
    pub fn distinct(&self) -> Self {
        let mut qs = self.clone();
        qs.distinct = true;
        qs
    }

    /// Adds a computed column under `alias`.
    ///
    /// When the expression aggregates, rows are grouped by every column of
    /// the model.
    pub fn annotate(&self, alias: impl Into<String>, expr: Expression) -> HojoResult<Self> {
        let alias = alias.into();
        if M::meta().field(&alias).is_some() {
            return Err(HojoError::FieldError(format!(
                "annotation '{alias}' conflicts with a field on {}",
                M::meta().name
            )));
        }
        for name in expr.referenced_fields() {
            self.check_column(name)?;
        }
        let mut qs = self.clone();
        qs.annotations.push((alias, expr));
        Ok(qs)
    }

    /// The accumulated filters in AND order.
    pub fn lookup_filters(&self) -> &[LookupFilter] {
        &self.filters
    }

    /// Compiles the filters into one conjunction; excluded filters are
    /// negated individually.
    pub fn compile_conditions(&self) -> WhereNode {
        WhereNode::And(self.filters.iter().map(LookupFilter::to_predicate).collect())
    }

    /// The SELECT this QuerySet would run.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        self.compiler().compile_select(&self.build_query())
    }

    /// Returns `true` once the QuerySet has fetched its rows.
    pub fn is_executed(&self) -> bool {
        self.cache.initialized()
    }

    // ── Reading ──────────────────────────────────────────────────────

    /// Runs the query on first use and returns the cached instances.
    pub async fn fetch(&self) -> HojoResult<&[M]> {
        let rows = self
            .cache
            .get_or_try_init(|| async {
                let rows = self.run_select(&self.build_query()).await?;
                rows.iter().map(M::from_row).collect::<HojoResult<Vec<M>>>()
            })
            .await?;
        Ok(rows.as_slice())
    }

    /// Iterates over the cached instances, executing first if needed.
    pub async fn iter(&self) -> HojoResult<std::slice::Iter<'_, M>> {
        Ok(self.fetch().await?.iter())
    }

    /// Number of cached instances, executing first if needed.
    pub async fn len(&self) -> HojoResult<usize> {
        Ok(self.fetch().await?.len())
    }

    /// Whether the result is empty, executing first if needed.
    pub async fn is_empty(&self) -> HojoResult<bool> {
        Ok(self.fetch().await?.is_empty())
    }

    /// The first cached instance, or `None` when there are none.
    pub async fn first(&self) -> HojoResult<Option<M>> {
        Ok(self.fetch().await?.first().cloned())
    }

    /// The last cached instance, or `None` when there are none.
    pub async fn last(&self) -> HojoResult<Option<M>> {
        Ok(self.fetch().await?.last().cloned())
    }

    /// Counts matching rows. Uses the cache when the QuerySet has executed,
    /// otherwise runs a `COUNT` without populating the cache.
    pub async fn count(&self) -> HojoResult<u64> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached.len() as u64);
        }
        let (sql, params) = self.compiler().compile_count(&self.build_query());
        let rows = self.run(&sql, &params).await?;
        let count = rows
            .first()
            .map_or(Ok(0), |row| row.get::<i64>("__count"))?;
        u64::try_from(count).map_err(|e| HojoError::Database(e.to_string()))
    }

    /// Whether any row matches.
    pub async fn exists(&self) -> HojoResult<bool> {
        if let Some(cached) = self.cache.get() {
            return Ok(!cached.is_empty());
        }
        Ok(self.count().await? > 0)
    }

    /// Exactly one instance matching the extra filters.
    ///
    /// Fails with `NotFound` when nothing matches and `MultipleResults` when
    /// more than one row does. Does not touch this QuerySet's cache.
    pub async fn get<I, K, V>(&self, filters: I) -> HojoResult<M>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let qs = self.filter_all(filters)?;
        let rows = qs.run_select(&qs.build_query()).await?;
        match rows.as_slice() {
            [] => Err(HojoError::NotFound(format!(
                "{} matching query does not exist.",
                M::meta().name
            ))),
            [row] => M::from_row(row),
            _ => Err(HojoError::MultipleResults(format!(
                "get() returned more than one {} -- it returned {}!",
                M::meta().name,
                rows.len()
            ))),
        }
    }

    /// Rows restricted to `fields` (columns or annotation aliases), in the
    /// requested order. An empty list means every column and annotation.
    pub async fn values(&self, fields: &[&str]) -> HojoResult<Vec<Row>> {
        let names: Vec<String> = if fields.is_empty() {
            M::meta()
                .column_names()
                .into_iter()
                .map(str::to_string)
                .chain(self.annotations.iter().map(|(alias, _)| alias.clone()))
                .collect()
        } else {
            fields.iter().map(|f| (*f).to_string()).collect()
        };

        let mut query = self.build_query();
        for name in &names {
            if self.is_annotation(name) {
                continue;
            }
            self.check_column(name)?;
            query.columns.push(name.clone());
        }
        query.annotations.retain(|(alias, _)| names.contains(alias));

        let rows = self.run_select(&query).await?;
        Ok(rows
            .iter()
            .map(|row| {
                let values = names
                    .iter()
                    .map(|name| row.get_value(name).cloned().unwrap_or(Value::Null))
                    .collect();
                Row::new(names.clone(), values)
            })
            .collect())
    }

    /// Tuples of the requested fields. With `flat` and exactly one field the
    /// values are returned bare; otherwise each row is a [`Value::List`].
    pub async fn values_list(&self, fields: &[&str], flat: bool) -> HojoResult<Vec<Value>> {
        if flat && fields.len() != 1 {
            return Err(HojoError::FieldError(
                "values_list(flat) requires exactly one field".to_string(),
            ));
        }
        let rows = self.values(fields).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let mut values: Vec<Value> = row.iter().map(|(_, v)| v.clone()).collect();
                if flat {
                    values.pop().unwrap_or(Value::Null)
                } else {
                    Value::List(values)
                }
            })
            .collect())
    }

    /// Computes named aggregates over the matching rows and returns them as
    /// one row.
    pub async fn aggregate(&self, aggregates: &[(&str, Expression)]) -> HojoResult<Row> {
        let mut named = Vec::with_capacity(aggregates.len());
        for (alias, expr) in aggregates {
            if !expr.contains_aggregate() {
                return Err(HojoError::FieldError(format!(
                    "'{alias}' is not an aggregate expression"
                )));
            }
            for name in expr.referenced_fields() {
                self.check_column(name)?;
            }
            named.push(((*alias).to_string(), expr.clone()));
        }
        let (sql, params) = self
            .compiler()
            .compile_aggregate(&self.build_query(), &named);
        let rows = self.run(&sql, &params).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| HojoError::Database("aggregate returned no row".to_string()))
    }

    // ── Writing ──────────────────────────────────────────────────────

    /// Loads an instance from a JSON object and inserts it in its own unit
    /// of work.
    pub async fn create(&self, fields: &JsonValue) -> HojoResult<M> {
        let instance = M::load(fields)?;
        self.insert(&instance, "create").await?;
        Ok(instance)
    }

    /// Like [`create`](Self::create), from JSON text.
    pub async fn create_from(&self, json: &str) -> HojoResult<M> {
        let instance = M::loads(json)?;
        self.insert(&instance, "create").await?;
        Ok(instance)
    }

    /// Inserts an existing instance in its own unit of work.
    pub async fn create_instance(&self, instance: &M) -> HojoResult<M> {
        self.insert(instance, "create").await?;
        Ok(instance.clone())
    }

    /// Returns the instance matching every key of `fields`, creating it from
    /// `fields` when none exists. The flag is `true` when a row was created.
    ///
    /// The lookup and the insert are separate units of work; a concurrent
    /// insert surfaces as an `Integrity` error from the backend.
    pub async fn get_or_create(&self, fields: &JsonValue) -> HojoResult<(M, bool)> {
        let object = fields.as_object().ok_or_else(|| {
            HojoError::FieldError("get_or_create expects a JSON object".to_string())
        })?;
        let converter = Converter::global();
        let mut lookup = Vec::with_capacity(object.len());
        for (key, raw) in object {
            let field = M::meta()
                .field(key)
                .filter(|f| !f.is_relation())
                .ok_or_else(|| self.unknown_field(key))?;
            lookup.push((key.as_str(), converter.structure(raw, &field.field_type)?));
        }

        match self.get(lookup).await {
            Ok(found) => Ok((found, false)),
            Err(HojoError::NotFound(_)) => Ok((self.create(fields).await?, true)),
            Err(err) => Err(err),
        }
    }

    /// Inserts every instance with one multi-row statement.
    pub async fn bulk_create(&self, objects: &[M]) -> HojoResult<u64> {
        if objects.is_empty() {
            return Ok(0);
        }
        let rows = objects
            .iter()
            .map(M::column_values)
            .collect::<HojoResult<Vec<_>>>()?;
        let (sql, params) =
            compile_bulk_insert(M::table_name(), &rows, self.session.backend_type());
        self.run_unit(&sql, &params, "bulk_create").await
    }

    /// Writes `fields` of every instance, matched by primary key, with one
    /// statement.
    pub async fn bulk_update(&self, objects: &[M], fields: &[&str]) -> HojoResult<u64> {
        for name in fields {
            self.check_column(name)?;
        }
        let pk_name = M::pk_field_name();
        if fields.contains(&pk_name) {
            return Err(HojoError::FieldError(
                "bulk_update cannot change the primary key".to_string(),
            ));
        }
        let keyed = objects
            .iter()
            .map(|obj| {
                let pk = obj.pk().ok_or_else(|| {
                    HojoError::Database("bulk_update requires every object to have a primary key".to_string())
                })?;
                Ok((pk, obj.column_values()?))
            })
            .collect::<HojoResult<Vec<_>>>()?;

        let (sql, params) = compile_bulk_update(
            M::table_name(),
            pk_name,
            &keyed,
            fields,
            self.session.backend_type(),
        );
        if sql.is_empty() {
            return Ok(0);
        }
        self.run_unit(&sql, &params, "bulk_update").await
    }

    /// Sets `fields` on every matching row. The cache is left as it is.
    pub async fn update<I, K, V>(&self, fields: I) -> HojoResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut assignments: Vec<(&'static str, Value)> = Vec::new();
        for (key, value) in fields {
            let field = M::meta()
                .column_fields()
                .find(|f| f.name == key.as_ref())
                .ok_or_else(|| self.unknown_field(key.as_ref()))?;
            assignments.push((field.name, value.into()));
        }
        if assignments.is_empty() {
            return Ok(0);
        }
        let conditions = self.compile_conditions();
        let (sql, params) =
            self.compiler()
                .compile_update(M::table_name(), &assignments, Some(&conditions));
        self.run_unit(&sql, &params, "update").await
    }

    /// Deletes every matching row. The cache is left as it is.
    pub async fn delete(&self) -> HojoResult<u64> {
        let conditions = self.compile_conditions();
        let (sql, params) = self
            .compiler()
            .compile_delete(M::table_name(), Some(&conditions));
        self.run_unit(&sql, &params, "delete").await
    }

    // ── Internals ────────────────────────────────────────────────────

    fn compiler(&self) -> SqlCompiler {
        SqlCompiler::new(self.session.backend_type())
    }

    fn build_query(&self) -> Query {
        let mut query = Query::new(M::table_name());
        if !self.filters.is_empty() {
            query.where_clause = Some(self.compile_conditions());
        }
        query.order_by.clone_from(&self.ordering);
        query.distinct = self.distinct;
        query.annotations.clone_from(&self.annotations);
        if self.annotations.iter().any(|(_, e)| e.contains_aggregate()) {
            query.group_by = M::meta()
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();
        }
        query
    }

    fn is_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|(alias, _)| alias == name)
    }

    fn unknown_field(&self, name: &str) -> HojoError {
        HojoError::FieldError(format!(
            "Cannot resolve keyword '{name}' into field. Choices are: {}",
            M::meta().column_names().join(", ")
        ))
    }

    fn check_column(&self, name: &str) -> HojoResult<()> {
        match M::meta().field(name) {
            Some(field) if field.is_relation() => Err(HojoError::FieldError(format!(
                "'{name}' is a relationship on {} and cannot be queried",
                M::meta().name
            ))),
            Some(_) => Ok(()),
            None => Err(self.unknown_field(name)),
        }
    }

    async fn run_select(&self, query: &Query) -> HojoResult<Vec<Row>> {
        let (sql, params) = self.compiler().compile_select(query);
        self.run(&sql, &params).await
    }

    async fn run(&self, sql: &str, params: &[Value]) -> HojoResult<Vec<Row>> {
        tracing::debug!(model = M::meta().name, sql, params = params.len(), "executing query");
        self.session.query(sql, params).await
    }

    async fn run_unit(&self, sql: &str, params: &[Value], operation: &str) -> HojoResult<u64> {
        let span = unit_of_work_span(M::meta().name, operation);
        async {
            tracing::debug!(sql, params = params.len(), "executing statement");
            let affected = self.session.execute_in_unit(sql, params).await?;
            tracing::debug!(affected, "committed");
            Ok::<u64, HojoError>(affected)
        }
        .instrument(span)
        .await
    }

    async fn insert(&self, instance: &M, operation: &str) -> HojoResult<u64> {
        let values = instance.column_values()?;
        let (sql, params) = self.compiler().compile_insert(M::table_name(), &values);
        self.run_unit(&sql, &params, operation).await
    }
}

/// The entry point for model-level query operations.
///
/// A `Manager` holds no query state; each call builds a fresh QuerySet.
/// Without an explicit session it uses the process-wide default connection.
pub struct Manager<M: Model> {
    session: Option<Arc<dyn Session>>,
    _model: PhantomData<M>,
}

impl<M: Model> Default for Manager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> fmt::Debug for Manager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("model", &M::meta().name)
            .field("bound", &self.session.is_some())
            .finish()
    }
}

impl<M: Model> Manager<M> {
    /// Creates a manager that uses the default connection.
    pub const fn new() -> Self {
        Self {
            session: None,
            _model: PhantomData,
        }
    }

    /// Binds this manager to `session`.
    #[must_use]
    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// A fresh QuerySet over all rows of the model.
    pub fn get_queryset(&self) -> HojoResult<QuerySet<M>> {
        let session = match &self.session {
            Some(session) => Arc::clone(session),
            None => default_session()?,
        };
        Ok(QuerySet::new(session))
    }

    /// See [`QuerySet::all`].
    pub fn all(&self) -> HojoResult<QuerySet<M>> {
        self.get_queryset()
    }

    /// See [`QuerySet::filter`].
    pub fn filter(&self, key: &str, value: impl Into<Value>) -> HojoResult<QuerySet<M>> {
        self.get_queryset()?.filter(key, value)
    }

    /// See [`QuerySet::exclude`].
    pub fn exclude(&self, key: &str, value: impl Into<Value>) -> HojoResult<QuerySet<M>> {
        self.get_queryset()?.exclude(key, value)
    }

    /// See [`QuerySet::order_by`].
    pub fn order_by(&self, fields: &[&str]) -> HojoResult<QuerySet<M>> {
        self.get_queryset()?.order_by(fields)
    }

    /// See [`QuerySet::annotate`].
    pub fn annotate(&self, alias: impl Into<String>, expr: Expression) -> HojoResult<QuerySet<M>> {
        self.get_queryset()?.annotate(alias, expr)
    }

    /// See [`QuerySet::reverse`].
    pub fn reverse(&self) -> HojoResult<QuerySet<M>> {
        Ok(self.get_queryset()?.reverse())
    }

    /// See [`QuerySet::distinct`].
    pub fn distinct(&self) -> HojoResult<QuerySet<M>> {
        Ok(self.get_queryset()?.distinct())
    }

    /// See [`QuerySet::first`].
    pub async fn first(&self) -> HojoResult<Option<M>> {
        self.get_queryset()?.first().await
    }

    /// See [`QuerySet::last`].
    pub async fn last(&self) -> HojoResult<Option<M>> {
        self.get_queryset()?.last().await
    }

    /// See [`QuerySet::count`].
    pub async fn count(&self) -> HojoResult<u64> {
        self.get_queryset()?.count().await
    }

    /// See [`QuerySet::exists`].
    pub async fn exists(&self) -> HojoResult<bool> {
        self.get_queryset()?.exists().await
    }

    /// See [`QuerySet::get`].
    pub async fn get<I, K, V>(&self, filters: I) -> HojoResult<M>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.get_queryset()?.get(filters).await
    }

    /// See [`QuerySet::create`].
    pub async fn create(&self, fields: &JsonValue) -> HojoResult<M> {
        self.get_queryset()?.create(fields).await
    }

    /// See [`QuerySet::create_from`].
    pub async fn create_from(&self, json: &str) -> HojoResult<M> {
        self.get_queryset()?.create_from(json).await
    }

    /// See [`QuerySet::create_instance`].
    pub async fn create_instance(&self, instance: &M) -> HojoResult<M> {
        self.get_queryset()?.create_instance(instance).await
    }

    /// See [`QuerySet::get_or_create`].
    pub async fn get_or_create(&self, fields: &JsonValue) -> HojoResult<(M, bool)> {
        self.get_queryset()?.get_or_create(fields).await
    }

    /// See [`QuerySet::bulk_create`].
    pub async fn bulk_create(&self, objects: &[M]) -> HojoResult<u64> {
        self.get_queryset()?.bulk_create(objects).await
    }

    /// See [`QuerySet::bulk_update`].
    pub async fn bulk_update(&self, objects: &[M], fields: &[&str]) -> HojoResult<u64> {
        self.get_queryset()?.bulk_update(objects, fields).await
    }

    /// See [`QuerySet::values`].
    pub async fn values(&self, fields: &[&str]) -> HojoResult<Vec<Row>> {
        self.get_queryset()?.values(fields).await
    }

    /// See [`QuerySet::values_list`].
    pub async fn values_list(&self, fields: &[&str], flat: bool) -> HojoResult<Vec<Value>> {
        self.get_queryset()?.values_list(fields, flat).await
    }

    /// See [`QuerySet::aggregate`].
    pub async fn aggregate(&self, aggregates: &[(&str, Expression)]) -> HojoResult<Row> {
        self.get_queryset()?.aggregate(aggregates).await
    }

    /// See [`QuerySet::update`].
    pub async fn update<I, K, V>(&self, fields: I) -> HojoResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.get_queryset()?.update(fields).await
    }

    /// See [`QuerySet::delete`].
    pub async fn delete(&self) -> HojoResult<u64> {
        self.get_queryset()?.delete().await
    }
}
