// Tests for the record! macro and the optional-field write path.

use anyhow::Result;
use sqlite_mapper::{record, Database, FieldDef, FieldKind, Record, SqliteConfig, Value};

record! {
    /// A product row; `cached_label` is local state only.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Product {
        pub id: Option<i64> => "id",
        pub title: Option<String> => "title",
        pub price: Option<f64> => "price",
        pub stock: i64 => "qty",
        pub cached_label: String,
    }
}

fn create_test_db() -> Result<Database> {
    let db = Database::open_in_memory()?;
    db.execute_batch(
        "CREATE TABLE products (id INTEGER PRIMARY KEY, title TEXT, price REAL, qty INTEGER);",
    )?;
    Ok(db)
}

#[test]
fn test_field_description() {
    assert_eq!(
        Product::fields(),
        &[
            FieldDef { field: "id", column: "id", kind: FieldKind::Integer },
            FieldDef { field: "title", column: "title", kind: FieldKind::Text },
            FieldDef { field: "price", column: "price", kind: FieldKind::Real },
            FieldDef { field: "stock", column: "qty", kind: FieldKind::Integer },
        ]
    );
}

#[test]
fn test_untagged_field_is_never_mapped() {
    let product = Product {
        cached_label: "label".to_string(),
        ..Default::default()
    };
    assert!(product.to_column_map().is_empty());
    assert_eq!(product.column_value("cached_label"), None);
}

#[test]
fn test_optional_zero_is_written() {
    test_optional_zero_is_written_impl().unwrap();
}

fn test_optional_zero_is_written_impl() -> Result<()> {
    let db = create_test_db()?;
    let product = Product {
        title: Some(String::new()),
        price: Some(0.0),
        stock: 0,
        ..Default::default()
    };

    // The typed write keeps the explicit empty title and zero price
    let values = product.to_values();
    assert_eq!(values.get("price"), Some(&Value::Real(0.0)));
    assert_eq!(values.get("title"), Some(&Value::Text(String::new())));
    assert!(!values.contains_key("qty"));

    let id = db
        .insert_record("products", &product)?
        .inserted_id()
        .expect("rowid");

    let stored: Product = db.query_record("SELECT * FROM products WHERE id = ?1", [id])?;
    assert_eq!(stored.id, Some(id));
    assert_eq!(stored.title.as_deref(), Some(""));
    assert_eq!(stored.price, Some(0.0));
    assert_eq!(stored.stock, 0);
    Ok(())
}

#[test]
fn test_null_reads_back_as_none() {
    test_null_reads_back_as_none_impl().unwrap();
}

fn test_null_reads_back_as_none_impl() -> Result<()> {
    let db = create_test_db()?;
    db.execute("INSERT INTO products (id, qty) VALUES (1, 5)", [])?;

    let mut product = Product {
        title: Some("stale".to_string()),
        cached_label: "stale".to_string(),
        ..Default::default()
    };
    db.query("SELECT * FROM products", [], |cursor| cursor.fetch(&mut product))?;
    assert_eq!(
        product,
        Product {
            id: Some(1),
            stock: 5,
            ..Default::default()
        }
    );
    Ok(())
}

#[test]
fn test_update_record_touches_only_set_fields() {
    test_update_record_touches_only_set_fields_impl().unwrap();
}

fn test_update_record_touches_only_set_fields_impl() -> Result<()> {
    let db = create_test_db()?;
    db.execute(
        "INSERT INTO products (id, title, price, qty) VALUES (1, 'lamp', 9.5, 3)",
        [],
    )?;

    let patch = Product {
        price: Some(7.25),
        ..Default::default()
    };
    let outcome = db.update_record("products", &patch, Some("id = ?"), &[Value::Integer(1)])?;
    assert_eq!(outcome.rows_affected(), Some(1));

    let stored: Product = db.query_record("SELECT * FROM products WHERE id = 1", [])?;
    assert_eq!(stored.title.as_deref(), Some("lamp"));
    assert_eq!(stored.price, Some(7.25));
    assert_eq!(stored.stock, 3);
    Ok(())
}

#[test]
fn test_records_iterator() {
    test_records_iterator_impl().unwrap();
}

fn test_records_iterator_impl() -> Result<()> {
    let db = create_test_db()?;
    for (title, qty) in [("a", 1), ("b", 2), ("c", 3)] {
        db.execute(
            "INSERT INTO products (title, qty) VALUES (?1, ?2)",
            sqlite_mapper::params![title, qty],
        )?;
    }

    let mut stmt = db.prepare("SELECT title, qty FROM products WHERE qty >= ?1 ORDER BY qty")?;
    let titles = stmt
        .query([2])?
        .records::<Product>()
        .map(|p| p.map(|p| p.title.unwrap_or_default()))
        .collect::<sqlite_mapper::Result<Vec<_>>>()?;
    assert_eq!(titles, vec!["b", "c"]);

    // Re-running the statement starts a fresh cursor
    let all: Vec<Product> = stmt.query([0])?.collect_records()?;
    assert_eq!(all.len(), 3);
    Ok(())
}

#[test]
fn test_config_from_json() {
    let config: SqliteConfig = serde_json::from_str(r#"{ "db_path": "data/app.db" }"#).unwrap();
    assert_eq!(config, SqliteConfig::new("data/app.db"));
    assert!(!config.create_if_missing);

    let config: SqliteConfig =
        serde_json::from_str(r#"{ "db_path": ":memory:", "create_if_missing": true }"#).unwrap();
    assert_eq!(config, SqliteConfig::in_memory().with_create_if_missing(true));
    assert!(Database::open(&config).is_ok());
}
