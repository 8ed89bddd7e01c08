//! Table and relationship mapping.
//!
//! Models are collected into a [`ModelRegistry`] at start-up and mapped in
//! one pass by [`automap`]. Each model becomes a [`TableDef`]: the table is
//! named after the pluralized, lower-cased model name; every scalar field
//! becomes a [`ColumnDef`]; named index and unique groups become composite
//! indexes called `ix_<sorted fields>`. Relationship fields produce no column
//! and are only recorded by a [`RelationshipManager`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use hojo_core::{HojoError, HojoResult};

use crate::executor::Session;
use crate::fields::{Constraint, FieldDef, FieldType, Relation};
use crate::model::{Model, ModelMeta};

/// The models known to the application, in registration order.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: Vec<&'static ModelMeta>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `M`. Registering the same model twice has no effect.
    pub fn register<M: Model>(&mut self) -> &mut Self {
        let meta = M::meta();
        if !self.models.iter().any(|m| std::ptr::eq(*m, meta)) {
            self.models.push(meta);
        }
        self
    }

    /// Registered model metadata.
    pub fn models(&self) -> &[&'static ModelMeta] {
        &self.models
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Column types produced by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// `INTEGER`.
    Integer,
    /// `FLOAT`.
    Float,
    /// `VARCHAR`.
    Varchar,
    /// `BOOLEAN`.
    Boolean,
    /// `TIMESTAMP`.
    Timestamp,
    /// `DATE`.
    Date,
    /// `UUID`.
    Uuid,
}

impl SqlType {
    /// The type as written in DDL.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Varchar => "VARCHAR",
            Self::Boolean => "BOOLEAN",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Uuid => "UUID",
        }
    }

    /// Maps a field type; `json` has no column type.
    pub const fn for_field(field_type: &FieldType) -> Option<Self> {
        match field_type {
            FieldType::Int | FieldType::IntEnum { .. } => Some(Self::Integer),
            FieldType::Float => Some(Self::Float),
            FieldType::String | FieldType::StrEnum { .. } => Some(Self::Varchar),
            FieldType::Bool => Some(Self::Boolean),
            FieldType::DateTime => Some(Self::Timestamp),
            FieldType::Date => Some(Self::Date),
            FieldType::Uuid => Some(Self::Uuid),
            FieldType::Json => None,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name (the field name).
    pub name: &'static str,
    /// Column type.
    pub sql_type: SqlType,
    /// Whether this is the primary key.
    pub primary_key: bool,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the column has its own index.
    pub index: bool,
    /// Whether the column has its own unique constraint.
    pub unique: bool,
}

impl ColumnDef {
    fn ddl(&self) -> String {
        let mut sql = format!("\"{}\" {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.unique && !self.primary_key {
            sql.push_str(" UNIQUE");
        }
        sql
    }
}

/// A composite index built from a named group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    /// `ix_` followed by the sorted column names joined with `_`.
    pub name: String,
    /// Columns in sorted order.
    pub columns: Vec<&'static str>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

/// Collects relationship fields without resolving them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipManager {
    relationships: BTreeMap<&'static str, Relation>,
}

impl RelationshipManager {
    /// Records a relationship field.
    pub fn add_relationship(&mut self, field_name: &'static str, relation: Relation) {
        self.relationships.insert(field_name, relation);
    }

    /// Recorded relationships keyed by field name.
    pub const fn get_relationships(&self) -> &BTreeMap<&'static str, Relation> {
        &self.relationships
    }
}

/// The mapped form of one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// The model name.
    pub model: &'static str,
    /// The table name.
    pub name: String,
    /// Columns in field declaration order.
    pub columns: Vec<ColumnDef>,
    /// Composite indexes from named groups, ordered by name.
    pub indexes: Vec<IndexDef>,
    /// Relationship fields seen while mapping.
    pub relationships: RelationshipManager,
}

impl TableDef {
    /// Maps one model.
    pub fn build(meta: &ModelMeta) -> HojoResult<Self> {
        let mut columns = Vec::new();
        let mut index_groups: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
        let mut unique_groups: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
        let mut relationships = RelationshipManager::default();
        let pk = meta.pk_field().map(|f| f.name);

        for field in &meta.fields {
            if let Some(relation) = field.relation {
                relationships.add_relationship(field.name, relation);
                continue;
            }
            let sql_type = SqlType::for_field(&field.field_type).ok_or_else(|| {
                HojoError::Mapping {
                    model: meta.name.to_string(),
                    field: field.name.to_string(),
                    field_type: field.field_type.to_string(),
                }
            })?;
            let primary_key = pk == Some(field.name);
            columns.push(ColumnDef {
                name: field.name,
                sql_type,
                primary_key,
                nullable: field.null && !primary_key,
                index: constraint_flag(field, field.index, &mut index_groups),
                unique: constraint_flag(field, field.unique, &mut unique_groups),
            });
        }

        let mut indexes: Vec<IndexDef> = index_groups
            .into_values()
            .map(|cols| composite_index(cols, false))
            .chain(unique_groups.into_values().map(|cols| composite_index(cols, true)))
            .collect();
        indexes.sort_by(|a, b| a.name.cmp(&b.name).then(a.unique.cmp(&b.unique)));

        Ok(Self {
            model: meta.name,
            name: meta.table_name().to_string(),
            columns,
            indexes,
            relationships,
        })
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn column_index_name(&self, column: &str) -> String {
        format!("ix_{}_{column}", self.name)
    }

    /// Every index this table creates, with the declaration behind it
    /// rendered as `Model(field, ..)`.
    pub fn index_names(&self) -> Vec<(String, String)> {
        let single = self.columns.iter().filter(|c| c.index).map(|c| {
            (self.column_index_name(c.name), format!("{}({})", self.model, c.name))
        });
        let groups = self.indexes.iter().map(|idx| {
            (idx.name.clone(), format!("{}({})", self.model, idx.columns.join(", ")))
        });
        single.chain(groups).collect()
    }

    /// `CREATE TABLE` followed by the `CREATE INDEX` statements.
    pub fn create_sql(&self) -> Vec<String> {
        let body = self
            .columns
            .iter()
            .map(ColumnDef::ddl)
            .collect::<Vec<_>>()
            .join(", ");
        let mut statements = vec![format!("CREATE TABLE IF NOT EXISTS \"{}\" ({body})", self.name)];

        for column in self.columns.iter().filter(|c| c.index) {
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS \"{}\" ON \"{}\" (\"{}\")",
                self.column_index_name(column.name),
                self.name,
                column.name
            ));
        }
        for index in &self.indexes {
            let unique = if index.unique { "UNIQUE " } else { "" };
            let cols: Vec<String> = index.columns.iter().map(|c| format!("\"{c}\"")).collect();
            statements.push(format!(
                "CREATE {unique}INDEX IF NOT EXISTS \"{}\" ON \"{}\" ({})",
                index.name,
                self.name,
                cols.join(", ")
            ));
        }
        statements
    }
}

/// A single flag is returned as-is; a named group is collected and the
/// column itself gets no flag.
fn constraint_flag(
    field: &FieldDef,
    constraint: Constraint,
    groups: &mut BTreeMap<&'static str, Vec<&'static str>>,
) -> bool {
    match constraint {
        Constraint::None => false,
        Constraint::Single => true,
        Constraint::Group(group) => {
            groups.entry(group).or_default().push(field.name);
            false
        }
    }
}

fn composite_index(mut columns: Vec<&'static str>, unique: bool) -> IndexDef {
    columns.sort_unstable();
    IndexDef {
        name: format!("ix_{}", columns.join("_")),
        columns,
        unique,
    }
}

/// The mapped tables of a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    tables: Vec<TableDef>,
}

impl Mapping {
    /// Tables in registration order.
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    /// Looks up a table by model name.
    pub fn table_for(&self, model: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.model == model)
    }

    /// Every DDL statement, table by table.
    pub fn create_sql(&self) -> Vec<String> {
        self.tables.iter().flat_map(TableDef::create_sql).collect()
    }

    /// Runs the DDL, one unit of work per statement.
    pub async fn create_all(&self, session: &dyn Session) -> HojoResult<()> {
        for sql in self.create_sql() {
            tracing::debug!(sql = %sql, "executing DDL");
            session.execute_in_unit(&sql, &[]).await?;
        }
        tracing::info!(tables = self.tables.len(), "created tables");
        Ok(())
    }
}

/// Maps every registered model.
///
/// Fails with [`HojoError::Mapping`] naming the first field whose type has
/// no column mapping, and with [`HojoError::DuplicateIndex`] when two index
/// declarations, in one table or across tables, produce the same index name.
pub fn automap(registry: &ModelRegistry) -> HojoResult<Mapping> {
    let tables = registry
        .models()
        .iter()
        .map(|meta| TableDef::build(meta))
        .collect::<HojoResult<Vec<_>>>()?;

    let mut declared: HashMap<String, String> = HashMap::new();
    for (index, owner) in tables.iter().flat_map(TableDef::index_names) {
        if let Some(first) = declared.get(&index) {
            return Err(HojoError::DuplicateIndex {
                index,
                first: first.clone(),
                second: owner,
            });
        }
        declared.insert(index, owner);
    }
    tracing::info!(
        tables = tables.len(),
        names = ?tables.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        "mapped models"
    );
    Ok(Mapping { tables })
}
