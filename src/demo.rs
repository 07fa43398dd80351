// demo schema for `gene setup` and the questions `gene examples` asks about it
// ddl sticks to types sqlite, mysql, and postgres all accept

use crate::{Db, Error};
use tracing::info;

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(255) NOT NULL,
        country VARCHAR(50) NOT NULL,
        created_at VARCHAR(10) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        category VARCHAR(50) NOT NULL,
        price DOUBLE PRECISION NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        total DOUBLE PRECISION NOT NULL,
        order_date VARCHAR(10) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS WORKORDER (
        ID INTEGER PRIMARY KEY,
        ORGID VARCHAR(20) NOT NULL,
        STATUS VARCHAR(20) NOT NULL,
        TITLE VARCHAR(100) NOT NULL,
        CREATED_AT VARCHAR(10) NOT NULL
    )",
];

const SEED: [&str; 4] = [
    "INSERT INTO users (id, name, email, country, created_at) VALUES
        (1, 'Alice Johnson', 'alice@example.com', 'USA', '2024-01-15'),
        (2, 'Bruno Costa', 'bruno@example.com', 'Brazil', '2024-02-03'),
        (3, 'Chen Wei', 'chen@example.com', 'China', '2024-02-20'),
        (4, 'Dana Smith', 'dana@example.com', 'USA', '2024-03-11'),
        (5, 'Emil Larsen', 'emil@example.com', 'Denmark', '2024-04-01'),
        (6, 'Fatima Khan', 'fatima@example.com', 'USA', '2024-04-18')",
    "INSERT INTO products (id, name, category, price) VALUES
        (1, 'Laptop', 'Electronics', 1299.0),
        (2, 'Headphones', 'Electronics', 199.5),
        (3, 'Desk Chair', 'Furniture', 349.0),
        (4, 'Coffee Maker', 'Kitchen', 89.99),
        (5, 'Monitor', 'Electronics', 279.0)",
    "INSERT INTO orders (id, user_id, product_id, quantity, total, order_date) VALUES
        (1, 1, 1, 1, 1299.0, '2024-05-02'),
        (2, 1, 2, 2, 399.0, '2024-05-10'),
        (3, 2, 3, 1, 349.0, '2024-05-12'),
        (4, 3, 5, 2, 558.0, '2024-06-01'),
        (5, 4, 4, 1, 89.99, '2024-06-07'),
        (6, 6, 2, 1, 199.5, '2024-06-21'),
        (7, 6, 1, 1, 1299.0, '2024-07-04')",
    "INSERT INTO WORKORDER (ID, ORGID, STATUS, TITLE, CREATED_AT) VALUES
        (1, 'ORG-100', 'OPEN', 'Replace hydraulic hose', '2024-03-01'),
        (2, 'ORG-100', 'CLOSED', 'Annual inspection', '2024-03-04'),
        (3, 'ORG-200', 'OPEN', 'Calibrate sprayer', '2024-03-09'),
        (4, 'ORG-300', 'IN_PROGRESS', 'Engine diagnostics', '2024-03-15'),
        (5, 'ORG-200', 'CLOSED', 'Tire rotation', '2024-03-22')",
];

pub const EXAMPLE_QUESTIONS: [&str; 7] = [
    "How many users are there?",
    "Show me all users from USA",
    "What products do we have in Electronics category?",
    "Show me users and their recent orders",
    "What's the total revenue from all orders?",
    "Which country has the most users?",
    "How many work orders are there by each org?",
];

/// Create the demo tables and fill them if they're empty.
///
/// Returns how many rows were inserted, zero when the data was already there.
pub async fn seed(db: &Db) -> Result<u64, Error> {
    for ddl in SCHEMA {
        db.execute(ddl).await?;
    }

    let existing = db.execute("SELECT COUNT(*) AS n FROM users").await?;
    let count = existing
        .rows
        .first()
        .and_then(|row| row.first())
        .and_then(|v| v.as_i64())
        .unwrap_or(0);

    if count > 0 {
        info!(users = count, "demo data already present");
        return Ok(0);
    }

    let mut inserted = 0;
    for insert in SEED {
        inserted += db.execute(insert).await?.rows_affected.unwrap_or(0);
    }

    info!(rows = inserted, "demo data seeded");
    Ok(inserted)
}
