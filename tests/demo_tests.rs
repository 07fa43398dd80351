// tests for the demo schema and seed data

mod common;

use common::temp_db;
use serde_json::json;

#[tokio::test]
async fn test_seed_creates_and_fills_tables() {
    let t = temp_db().await;
    let inserted = gene::demo::seed(&t.db).await.unwrap();
    assert_eq!(inserted, 23);

    let tables = t.db.list_tables().await.unwrap();
    for name in ["WORKORDER", "orders", "products", "users"] {
        assert!(tables.iter().any(|t| t == name), "missing {name} in {tables:?}");
    }

    let users = t.db.execute("SELECT COUNT(*) FROM users").await.unwrap();
    assert_eq!(users.rows[0][0], json!(6));
}

#[tokio::test]
async fn test_seed_twice_is_a_noop() {
    let t = temp_db().await;
    gene::demo::seed(&t.db).await.unwrap();

    let again = gene::demo::seed(&t.db).await.unwrap();
    assert_eq!(again, 0);

    let orders = t.db.execute("SELECT COUNT(*) FROM orders").await.unwrap();
    assert_eq!(orders.rows[0][0], json!(7));
}

#[tokio::test]
async fn test_seeded_data_answers_example_questions() {
    let t = temp_db().await;
    gene::demo::seed(&t.db).await.unwrap();

    let result = t
        .db
        .execute("SELECT ORGID, COUNT(*) AS n FROM WORKORDER GROUP BY ORGID ORDER BY ORGID")
        .await
        .unwrap();
    assert_eq!(result.row_count, 3);
    assert_eq!(result.rows[0], vec![json!("ORG-100"), json!(2)]);

    let usa = t
        .db
        .execute("SELECT name FROM users WHERE country = 'USA'")
        .await
        .unwrap();
    assert_eq!(usa.row_count, 3);
}
