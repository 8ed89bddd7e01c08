//! Integration tests for the ORM execution pipeline.
//!
//! These tests run QuerySet and Manager operations end to end: SQL
//! compilation, execution on an in-memory SQLite database, and mapping the
//! rows back to model instances.

mod common;

use common::{database, heroes, seed_users, users, Hero, User};
use hojo_core::HojoError;
use hojo_db::query::LookupKind;
use hojo_db::{DumpOptions, Expression, LookupFilter, Schema, Value};
use serde_json::json;

fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|u| u.name.as_str()).collect()
}

// ── Reading ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_filter_and_exclude_conjunction() {
    let db = database().await;
    seed_users(&db).await;

    let qs = users(&db)
        .filter("age__gte", 21)
        .unwrap()
        .exclude("name", "Barret")
        .unwrap()
        .order_by(&["name"])
        .unwrap();
    assert_eq!(names(qs.fetch().await.unwrap()), vec!["Aerith", "Cloud"]);
}

#[tokio::test]
async fn test_scenario_d_against_database() {
    let db = database().await;
    seed_users(&db).await;
    users(&db)
        .create(&json!({"name": "Sephiroth", "age": 9}))
        .await
        .unwrap();

    let qs = users(&db)
        .filter("name", "Sephiroth")
        .unwrap()
        .exclude("age__gt", 10)
        .unwrap();
    assert_eq!(
        qs.compile_conditions().to_string(),
        "name == 'Sephiroth' AND NOT(age > 10)"
    );
    // The seeded Sephiroth has no age, so NOT(NULL > 10) is unknown and drops out.
    let found = qs.fetch().await.unwrap();
    assert_eq!(found, &[User::new("Sephiroth", Some(9))]);
}

#[tokio::test]
async fn test_lookup_operators() {
    let db = database().await;
    seed_users(&db).await;
    let count = |key: &'static str, value: Value| {
        let db = db.clone();
        async move {
            users(&db)
                .filter(key, value)
                .unwrap()
                .count()
                .await
                .unwrap()
        }
    };

    assert_eq!(count("age__lt", Value::from(21)).await, 1);
    assert_eq!(count("age__lte", Value::from(21)).await, 2);
    assert_eq!(count("age__gt", Value::from(21)).await, 2);
    assert_eq!(count("age__in", Value::from(vec![20, 35, 99])).await, 2);
    assert_eq!(count("age__in", Value::List(vec![])).await, 0);
    assert_eq!(count("age__isnull", Value::from(true)).await, 1);
    assert_eq!(count("age__isnull", Value::from(false)).await, 4);
    assert_eq!(count("age", Value::Null).await, 1);
    assert_eq!(count("age__between", Value::from(vec![20, 22])).await, 3);
    assert_eq!(count("name__contains", Value::from("ph")).await, 1);
    assert_eq!(count("name__startswith", Value::from("Ti")).await, 1);
    assert_eq!(count("name__endswith", Value::from("th")).await, 2);
    assert_eq!(count("name__like", Value::from("%e%")).await, 3);
    assert_eq!(count("name__ilike", Value::from("cLOUD")).await, 1);
}

#[tokio::test]
async fn test_typed_lookup_builder() {
    let db = database().await;
    seed_users(&db).await;
    let filter = LookupFilter::new("age", LookupKind::Gt, 21).unwrap();
    let qs = users(&db).all().unwrap().exclude_lookup(filter).unwrap();
    // NULL ages are unknown under NOT and drop out with the older users.
    assert_eq!(qs.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_ordering_reverse_first_last() {
    let db = database().await;
    seed_users(&db).await;

    let by_age = users(&db)
        .filter("age__isnull", false)
        .unwrap()
        .order_by(&["-age"])
        .unwrap();
    assert_eq!(by_age.first().await.unwrap().unwrap().name, "Barret");
    assert_eq!(by_age.last().await.unwrap().unwrap().name, "Tifa");

    let reversed = by_age.reverse();
    assert_eq!(
        names(reversed.fetch().await.unwrap()),
        vec!["Tifa", "Cloud", "Aerith", "Barret"]
    );
}

#[tokio::test]
async fn test_empty_table_reads() {
    let db = database().await;
    let qs = users(&db).all().unwrap();
    assert!(qs.is_empty().await.unwrap());
    assert_eq!(qs.first().await.unwrap(), None);
    assert_eq!(qs.last().await.unwrap(), None);
    assert!(!users(&db).exists().await.unwrap());
    assert_eq!(users(&db).count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_cache_is_not_refreshed_by_writes() {
    let db = database().await;
    seed_users(&db).await;

    let qs = users(&db).all().unwrap();
    assert_eq!(qs.len().await.unwrap(), 5);
    users(&db).create(&json!({"name": "Yuffie", "age": 16})).await.unwrap();
    assert_eq!(qs.len().await.unwrap(), 5);
    assert_eq!(qs.count().await.unwrap(), 5);
    assert_eq!(qs.all().count().await.unwrap(), 6);
}

#[tokio::test]
async fn test_get_contract() {
    let db = database().await;
    seed_users(&db).await;

    let tifa = users(&db).get([("name", "Tifa")]).await.unwrap();
    assert_eq!(tifa, User::new("Tifa", Some(20)));

    let missing = users(&db).get([("name", "Zack")]).await.unwrap_err();
    assert!(matches!(missing, HojoError::NotFound(_)));

    let many = users(&db)
        .get([("age__gt", Value::from(20))])
        .await
        .unwrap_err();
    assert!(matches!(many, HojoError::MultipleResults(_)));
}

#[tokio::test]
async fn test_values_and_values_list() {
    let db = database().await;
    seed_users(&db).await;
    let qs = users(&db)
        .filter("age__isnull", false)
        .unwrap()
        .order_by(&["age"])
        .unwrap();

    let rows = qs.values(&["age", "name"]).await.unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].columns(), &["age".to_string(), "name".to_string()]);
    assert_eq!(rows[0].get::<String>("name").unwrap(), "Tifa");

    let flat = qs.values_list(&["name"], true).await.unwrap();
    assert_eq!(
        flat,
        vec![
            Value::from("Tifa"),
            Value::from("Cloud"),
            Value::from("Aerith"),
            Value::from("Barret"),
        ]
    );

    let tuples = qs.values_list(&["name", "age"], false).await.unwrap();
    assert_eq!(
        tuples[0],
        Value::List(vec![Value::from("Tifa"), Value::Int(20)])
    );

    assert!(matches!(
        qs.values_list(&["name", "age"], true).await,
        Err(HojoError::FieldError(_))
    ));
}

#[tokio::test]
async fn test_aggregate() {
    let db = database().await;
    seed_users(&db).await;
    let row = users(&db)
        .all()
        .unwrap()
        .aggregate(&[
            ("total", Expression::count("age")),
            ("oldest", Expression::max("age")),
            ("youngest", Expression::min("age")),
            ("years", Expression::sum("age")),
        ])
        .await
        .unwrap();
    assert_eq!(row.get::<i64>("total").unwrap(), 4);
    assert_eq!(row.get::<i64>("oldest").unwrap(), 35);
    assert_eq!(row.get::<i64>("youngest").unwrap(), 20);
    assert_eq!(row.get::<i64>("years").unwrap(), 98);

    let avg = users(&db)
        .filter("name__in", vec!["Cloud", "Aerith"])
        .unwrap()
        .aggregate(&[("mean", Expression::avg("age"))])
        .await
        .unwrap();
    assert!((avg.get::<f64>("mean").unwrap() - 21.5).abs() < f64::EPSILON);

    assert!(matches!(
        users(&db)
            .all()
            .unwrap()
            .aggregate(&[("plain", Expression::f("age"))])
            .await,
        Err(HojoError::FieldError(_))
    ));
}

#[tokio::test]
async fn test_annotate_and_order_by_alias() {
    let db = database().await;
    seed_users(&db).await;
    let qs = users(&db)
        .annotate("people", Expression::count("name"))
        .unwrap()
        .order_by(&["name"])
        .unwrap();
    let rows = qs.values(&["name", "people"]).await.unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].get::<String>("name").unwrap(), "Aerith");
    assert_eq!(rows[0].get::<i64>("people").unwrap(), 1);
}

#[tokio::test]
async fn test_distinct() {
    let db = database().await;
    seed_users(&db).await;
    users(&db).create(&json!({"name": "Cloud", "age": 21})).await.unwrap();
    let qs = users(&db).filter("name", "Cloud").unwrap();
    assert_eq!(qs.count().await.unwrap(), 2);
    assert_eq!(qs.distinct().count().await.unwrap(), 1);
    assert_eq!(qs.distinct().len().await.unwrap(), 1);
}

// ── Writing ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_loads_and_persists() {
    let db = database().await;
    let created = users(&db).create(&json!({"name": "Jane"})).await.unwrap();
    assert_eq!(created, User::new("Jane", None));
    assert_eq!(users(&db).get([("name", "Jane")]).await.unwrap(), created);

    let from_text = users(&db)
        .create_from(r#"{"name": "John", "age": "30"}"#)
        .await
        .unwrap();
    assert_eq!(from_text.age, Some(30));
}

#[tokio::test]
async fn test_create_with_bad_input_writes_nothing() {
    let db = database().await;
    let err = users(&db)
        .create(&json!({"name": "John", "age": "thirty"}))
        .await
        .unwrap_err();
    assert!(matches!(err, HojoError::Validation(_)));
    assert_eq!(users(&db).count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_or_create() {
    let db = database().await;
    let (first, created) = users(&db)
        .get_or_create(&json!({"name": "Vincent", "age": 27}))
        .await
        .unwrap();
    assert!(created);
    let (second, created) = users(&db)
        .get_or_create(&json!({"name": "Vincent", "age": 27}))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(first, second);
    assert_eq!(users(&db).count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_and_delete() {
    let db = database().await;
    seed_users(&db).await;

    let updated = users(&db)
        .filter("age__lt", 22)
        .unwrap()
        .update([("age", Value::Int(30))])
        .await
        .unwrap();
    assert_eq!(updated, 2);
    assert_eq!(users(&db).filter("age", 30).unwrap().count().await.unwrap(), 2);

    let deleted = users(&db)
        .filter("age__isnull", true)
        .unwrap()
        .delete()
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(users(&db).count().await.unwrap(), 4);

    assert!(matches!(
        users(&db).all().unwrap().update([("surname", "x")]).await,
        Err(HojoError::FieldError(_))
    ));
}

#[tokio::test]
async fn test_unknown_field_is_rejected_before_execution() {
    let db = database().await;
    assert!(matches!(
        users(&db).filter("surname", "Hellen"),
        Err(HojoError::FieldError(_))
    ));
    assert!(matches!(
        users(&db).filter("age__bogus", 1),
        Err(HojoError::UnsupportedLookup(ref op)) if op == "bogus"
    ));
    assert!(matches!(
        heroes(&db).filter("party", "AVALANCHE"),
        Err(HojoError::FieldError(_))
    ));
}

// ── Persisted models ──────────────────────────────────────────────────

#[tokio::test]
async fn test_hero_round_trip_through_database() {
    let db = database().await;
    let zack = heroes(&db)
        .create(&json!({"name": "Zack", "role": "soldier", "hp": 980.5}))
        .await
        .unwrap();
    assert_eq!(zack.level, 1);

    let loaded = heroes(&db).get([("id", Value::Uuid(zack.id))]).await.unwrap();
    assert_eq!(loaded, zack);
    assert_eq!(
        loaded.dump(&DumpOptions::default()).unwrap(),
        zack.dump(&DumpOptions::default()).unwrap()
    );

    let by_date = heroes(&db)
        .filter("created_at__lte", zack.created_at)
        .unwrap()
        .count()
        .await
        .unwrap();
    assert_eq!(by_date, 1);
}

#[tokio::test]
async fn test_unique_column_violation_is_integrity_error() {
    let db = database().await;
    heroes(&db)
        .create(&json!({"name": "Cloud", "role": "soldier"}))
        .await
        .unwrap();
    let err = heroes(&db)
        .create(&json!({"name": "Cloud", "role": "avalanche"}))
        .await
        .unwrap_err();
    assert!(matches!(err, HojoError::Integrity(_)));
    assert_eq!(heroes(&db).count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_bulk_create_and_bulk_update() {
    let db = database().await;
    let party: Vec<Hero> = ["Cloud", "Tifa", "Barret"]
        .iter()
        .map(|name| Hero::load(&json!({"name": name, "role": "avalanche"})).unwrap())
        .collect();
    assert_eq!(heroes(&db).bulk_create(&party).await.unwrap(), 3);
    assert_eq!(heroes(&db).bulk_create(&[]).await.unwrap(), 0);

    let mut promoted = party.clone();
    for (i, hero) in promoted.iter_mut().enumerate() {
        hero.level = 10 + i64::try_from(i).unwrap();
        hero.hp = Some(100.0);
    }
    let changed = heroes(&db)
        .bulk_update(&promoted, &["level", "hp"])
        .await
        .unwrap();
    assert_eq!(changed, 3);

    let levels = heroes(&db)
        .order_by(&["level"])
        .unwrap()
        .values_list(&["level"], true)
        .await
        .unwrap();
    assert_eq!(levels, vec![Value::Int(10), Value::Int(11), Value::Int(12)]);
    assert_eq!(
        heroes(&db).get([("name", "Tifa")]).await.unwrap().hp,
        Some(100.0)
    );

    assert!(matches!(
        heroes(&db).bulk_update(&promoted, &["id"]).await,
        Err(HojoError::FieldError(_))
    ));
}

#[tokio::test]
async fn test_create_instance() {
    let db = database().await;
    let red = Hero::load(&json!({"name": "Red XIII", "role": "avalanche", "level": 4})).unwrap();
    heroes(&db).create_instance(&red).await.unwrap();
    let stored = heroes(&db).filter("role", "avalanche").unwrap();
    assert_eq!(stored.fetch().await.unwrap(), &[red]);
}
