//! Multi-row statement compilation for `bulk_create` and `bulk_update`.
//!
//! Both produce exactly one statement so a bulk write is still a single
//! statement inside its unit of work.

use super::compiler::{DatabaseBackendType, SqlCompiler};
use crate::value::Value;

/// Compiles a multi-row INSERT statement.
///
/// Generates SQL like:
/// ```sql
/// INSERT INTO "table" ("col1", "col2") VALUES ($1, $2), ($3, $4)
/// ```
///
/// Columns are taken from the first row; every row must list the same
/// columns in the same order. Returns an empty statement for no rows.
pub fn compile_bulk_insert(
    table: &str,
    rows: &[Vec<(&str, Value)>],
    backend: DatabaseBackendType,
) -> (String, Vec<Value>) {
    let Some(first) = rows.first() else {
        return (String::new(), Vec::new());
    };
    let compiler = SqlCompiler::new(backend);
    let mut params = Vec::new();

    let col_list = first
        .iter()
        .map(|(name, _)| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let row_strings: Vec<String> = rows
        .iter()
        .map(|row| {
            let placeholders: Vec<String> = row
                .iter()
                .map(|(_, val)| {
                    params.push(val.clone());
                    compiler.placeholder(params.len())
                })
                .collect();
            format!("({})", placeholders.join(", "))
        })
        .collect();

    (
        format!("INSERT INTO \"{table}\" ({col_list}) VALUES {}", row_strings.join(", ")),
        params,
    )
}

/// Compiles a single UPDATE that sets `fields` per primary key.
///
/// ```sql
/// UPDATE "t" SET "f" = CASE "id" WHEN $1 THEN $2 WHEN $3 THEN $4 ELSE "f" END
/// WHERE "id" IN ($5, $6)
/// ```
///
/// Each object is `(pk, field values)`; fields an object does not carry keep
/// their stored value. Returns an empty statement when there is nothing to do.
pub fn compile_bulk_update(
    table: &str,
    pk_field: &str,
    objects: &[(Value, Vec<(&str, Value)>)],
    fields: &[&str],
    backend: DatabaseBackendType,
) -> (String, Vec<Value>) {
    if objects.is_empty() || fields.is_empty() {
        return (String::new(), Vec::new());
    }
    let compiler = SqlCompiler::new(backend);
    let mut params: Vec<Value> = Vec::new();
    let bind = |params: &mut Vec<Value>, value: Value| {
        params.push(value);
        compiler.placeholder(params.len())
    };

    let mut set_parts = Vec::with_capacity(fields.len());
    for field in fields {
        let mut case = format!("\"{field}\" = CASE \"{pk_field}\"");
        for (pk, values) in objects {
            if let Some((_, value)) = values.iter().find(|(name, _)| name == field) {
                let pk_ph = bind(&mut params, pk.clone());
                let val_ph = bind(&mut params, value.clone());
                case.push_str(&format!(" WHEN {pk_ph} THEN {val_ph}"));
            }
        }
        case.push_str(&format!(" ELSE \"{field}\" END"));
        set_parts.push(case);
    }

    let pk_placeholders: Vec<String> = objects
        .iter()
        .map(|(pk, _)| bind(&mut params, pk.clone()))
        .collect();

    (
        format!(
            "UPDATE \"{table}\" SET {} WHERE \"{pk_field}\" IN ({})",
            set_parts.join(", "),
            pk_placeholders.join(", ")
        ),
        params,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_insert_postgres() {
        let rows = vec![
            vec![("name", Value::from("Cloud")), ("age", Value::Int(21))],
            vec![("name", Value::from("Tifa")), ("age", Value::Int(20))],
        ];
        let (sql, params) = compile_bulk_insert("users", &rows, DatabaseBackendType::PostgreSQL);
        assert_eq!(
            sql,
            "INSERT INTO \"users\" (\"name\", \"age\") VALUES ($1, $2), ($3, $4)"
        );
        assert_eq!(params.len(), 4);
        assert_eq!(params[2], Value::from("Tifa"));
    }

    #[test]
    fn test_bulk_insert_sqlite_placeholders() {
        let rows = vec![vec![("name", Value::from("Barret"))]];
        let (sql, _) = compile_bulk_insert("users", &rows, DatabaseBackendType::SQLite);
        assert_eq!(sql, "INSERT INTO \"users\" (\"name\") VALUES (?)");
    }

    #[test]
    fn test_bulk_insert_empty() {
        let (sql, params) = compile_bulk_insert("users", &[], DatabaseBackendType::SQLite);
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_bulk_update_single_statement() {
        let objects = vec![
            (Value::Int(1), vec![("age", Value::Int(30)), ("name", Value::from("a"))]),
            (Value::Int(2), vec![("age", Value::Int(40)), ("name", Value::from("b"))]),
        ];
        let (sql, params) = compile_bulk_update(
            "users",
            "id",
            &objects,
            &["age"],
            DatabaseBackendType::PostgreSQL,
        );
        assert_eq!(
            sql,
            "UPDATE \"users\" SET \"age\" = CASE \"id\" WHEN $1 THEN $2 WHEN $3 THEN $4 \
             ELSE \"age\" END WHERE \"id\" IN ($5, $6)"
        );
        assert_eq!(
            params,
            vec![
                Value::Int(1),
                Value::Int(30),
                Value::Int(2),
                Value::Int(40),
                Value::Int(1),
                Value::Int(2)
            ]
        );
    }

    #[test]
    fn test_bulk_update_nothing_to_do() {
        let objects = vec![(Value::Int(1), vec![("age", Value::Int(30))])];
        let (sql, _) =
            compile_bulk_update("users", "id", &objects, &[], DatabaseBackendType::SQLite);
        assert!(sql.is_empty());
    }
}
