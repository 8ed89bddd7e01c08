//! # hojo
//!
//! A lightweight async ORM: typed schemas that load from and dump to plain
//! JSON, lazy querysets, and table mapping for SQLite and PostgreSQL.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `hojo` to get everything, or on the individual crates
//! for finer-grained control.
//!
//! ```no_run
//! use hojo::prelude::*;
//!
//! # async fn run() -> HojoResult<()> {
//! Hojo::configure([("db_uri", "sqlite://app.db")]);
//! Hojo::init(&Settings::default())?;
//!
//! let mut registry = ModelRegistry::new();
//! // registry.register::<User>();
//! Hojo::create_tables(&registry).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

/// Errors, configuration, settings and logging.
pub use hojo_core as core;

/// Models, converter, schema, lookups, QuerySet, Manager and mapper.
pub use hojo_db as db;

/// Database backends: `SQLite`, `PostgreSQL`, and the connection.
pub use hojo_db_backends as db_backends;

pub use hojo_core::{Config, HojoError, HojoResult, Settings};
pub use hojo_db::{
    automap, base_fields, Converter, DumpOptions, Expression, FieldDef, FieldType, Manager,
    Mapping, Model, ModelMeta, ModelRegistry, QuerySet, Row, Schema, Value,
};
pub use hojo_db_backends::{connection, Connection};

/// The items most programs need, for glob import.
pub mod prelude {
    pub use crate::Hojo;
    pub use hojo_core::{Config, HojoError, HojoResult, Settings};
    pub use hojo_db::{
        base_fields, DumpOptions, Expression, FieldDef, FieldType, LookupFilter, LookupKind,
        Model, ModelMeta, ModelRegistry, Row, Schema, Value,
    };
    pub use hojo_db_backends::Connection;
}

/// Process-level entry points.
pub struct Hojo;

impl Hojo {
    /// Reads a configuration value.
    pub fn config(key: &str) -> Option<serde_json::Value> {
        Config::get(key)
    }

    /// Writes several configuration values.
    pub fn configure<I, K, V>(configs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        for (key, value) in configs {
            Config::set(key, value);
        }
    }

    /// Applies `settings` to the configuration store, installs logging, and
    /// installs the default connection resolved from the environment and
    /// configuration.
    pub fn init(settings: &Settings) -> HojoResult<Arc<Connection>> {
        settings.apply();
        hojo_core::logging::setup_logging(settings);
        connection::connect(None)
    }

    /// Maps every registered model and creates the missing tables and
    /// indexes through the default connection.
    pub async fn create_tables(registry: &ModelRegistry) -> HojoResult<Mapping> {
        let mapping = automap(registry)?;
        let session = hojo_db::default_session()?;
        mapping.create_all(session.as_ref()).await?;
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use serde_json::json;

    use super::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Materia {
        name: String,
        level: i64,
    }

    impl Model for Materia {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| {
                ModelMeta::new(
                    "Materia",
                    vec![
                        FieldDef::new("name", FieldType::String).unique(),
                        FieldDef::new("level", FieldType::Int).default_value(1),
                    ],
                )
            });
            &META
        }

        fn field_values(&self) -> Vec<(&'static str, Value)> {
            vec![("name", Value::from(&self.name)), ("level", Value::Int(self.level))]
        }

        fn from_row(row: &Row) -> HojoResult<Self> {
            Ok(Self {
                name: row.get("name")?,
                level: row.get("level")?,
            })
        }
    }

    #[test]
    fn test_config_round_trip() {
        assert_eq!(Hojo::config("facade_missing"), None);
        Hojo::configure([("facade_page_size", json!(25)), ("facade_mode", json!("strict"))]);
        assert_eq!(Hojo::config("facade_page_size"), Some(json!(25)));
        assert_eq!(Hojo::config("facade_mode"), Some(json!("strict")));
    }

    #[tokio::test]
    async fn test_init_and_create_tables() {
        let settings = Settings {
            db_uri: Some("sqlite::memory:".to_string()),
            ..Settings::default()
        };
        // An explicit DB_URI in the environment would take precedence.
        if std::env::var("DB_URI").is_ok() {
            return;
        }
        let conn = Hojo::init(&settings).unwrap();
        assert_eq!(conn.uri(), "sqlite::memory:");
        assert_eq!(Hojo::config("db_uri"), Some(json!("sqlite::memory:")));

        let mut registry = ModelRegistry::new();
        registry.register::<Materia>();
        let mapping = Hojo::create_tables(&registry).await.unwrap();
        assert_eq!(mapping.tables()[0].name, Materia::table_name());

        let fire = Materia::objects()
            .create(&json!({"name": "Fire"}))
            .await
            .unwrap();
        assert_eq!(fire.level, 1);
        assert_eq!(
            fire.dump(&DumpOptions::default()).unwrap(),
            json!({"name": "Fire", "level": 1})
        );
        assert_eq!(Materia::objects().count().await.unwrap(), 1);
        crate::connection::reset();
    }
}
