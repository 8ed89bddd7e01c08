//! Models and helpers shared by the SQLite integration tests.

#![allow(dead_code)]

use std::sync::{Arc, LazyLock};

use hojo_core::HojoResult;
use hojo_db::fields::{base_fields, FieldDef, FieldType};
use hojo_db::model::{Model, ModelMeta, Row};
use hojo_db::{automap, Manager, ModelRegistry, Session, Value};
use hojo_db_backends::SqliteBackend;

/// `User { name: str, age: optional int }`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub age: Option<i64>,
}

impl User {
    pub fn new(name: &str, age: Option<i64>) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }
}

impl Model for User {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new(
                "User",
                vec![
                    FieldDef::new("name", FieldType::String),
                    FieldDef::new("age", FieldType::Int).nullable(),
                ],
            )
        });
        &META
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![("name", Value::from(&self.name)), ("age", Value::from(self.age))]
    }

    fn from_row(row: &Row) -> HojoResult<Self> {
        Ok(Self {
            name: row.get("name")?,
            age: row.get("age")?,
        })
    }
}

pub const ROLES: &[&str] = &["soldier", "turk", "avalanche"];

/// A persisted model with the base fields, a unique name and an enum.
#[derive(Debug, Clone, PartialEq)]
pub struct Hero {
    pub id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub updated_at: chrono::DateTime<chrono::FixedOffset>,
    pub name: String,
    pub role: String,
    pub level: i64,
    pub hp: Option<f64>,
}

impl Model for Hero {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            let mut fields = base_fields();
            fields.extend([
                FieldDef::new("name", FieldType::String).unique(),
                FieldDef::new(
                    "role",
                    FieldType::StrEnum {
                        name: "Role",
                        choices: ROLES,
                    },
                )
                .index(),
                FieldDef::new("level", FieldType::Int).default_value(1),
                FieldDef::new("hp", FieldType::Float).nullable(),
                FieldDef::new("party", FieldType::String).belongs_to("Party"),
            ]);
            ModelMeta::new("Hero", fields)
        });
        &META
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Uuid(self.id)),
            ("created_at", Value::DateTime(self.created_at)),
            ("updated_at", Value::DateTime(self.updated_at)),
            ("name", Value::from(&self.name)),
            ("role", Value::from(&self.role)),
            ("level", Value::Int(self.level)),
            ("hp", Value::from(self.hp)),
        ]
    }

    fn from_row(row: &Row) -> HojoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            name: row.get("name")?,
            role: row.get("role")?,
            level: row.get("level")?,
            hp: row.get("hp")?,
        })
    }
}

/// An in-memory database with the `users` and `heroes` tables created.
pub async fn database() -> Arc<dyn Session> {
    let session: Arc<dyn Session> = Arc::new(SqliteBackend::memory().unwrap());
    let mut registry = ModelRegistry::new();
    registry.register::<User>().register::<Hero>();
    automap(&registry)
        .unwrap()
        .create_all(session.as_ref())
        .await
        .unwrap();
    session
}

pub fn users(session: &Arc<dyn Session>) -> Manager<User> {
    User::objects().with_session(Arc::clone(session))
}

pub fn heroes(session: &Arc<dyn Session>) -> Manager<Hero> {
    Hero::objects().with_session(Arc::clone(session))
}

/// Inserts the usual cast of users.
pub async fn seed_users(session: &Arc<dyn Session>) {
    let cast = [
        User::new("Cloud", Some(21)),
        User::new("Tifa", Some(20)),
        User::new("Barret", Some(35)),
        User::new("Aerith", Some(22)),
        User::new("Sephiroth", None),
    ];
    assert_eq!(users(session).bulk_create(&cast).await.unwrap(), 5);
}
