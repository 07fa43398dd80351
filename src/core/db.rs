// database connection and query execution
// supports sqlite, mysql, and postgres through the sqlx any driver

use crate::{DatabaseConfig, Error};
use serde::Serialize;
use sqlx::AnyConnection;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Column, Executor, Row, Statement};
use tracing::{debug, info};

pub struct Db {
    pool: AnyPool,
    dialect: Dialect,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
    /// set for statements that change rows instead of returning them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
}

impl QueryResult {
    fn affected(rows_affected: u64) -> Self {
        Self {
            columns: vec![],
            rows: vec![],
            row_count: 0,
            rows_affected: Some(rows_affected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Postgres,
    Sqlite,
    Mysql,
}

impl Db {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, Error> {
        sqlx::any::install_default_drivers();

        // figure out which database we're talking to
        let dialect = detect_dialect(&config.url);

        // one connection for the whole session
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.connect_timeout)
            .connect(&config.url)
            .await
            .map_err(Error::Connection)?;

        info!(dialect = dialect.name(), url = %config.display_url(), "connected");
        Ok(Self { pool, dialect })
    }

    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }

    pub async fn ping(&self) -> Result<(), Error> {
        self.execute("SELECT 1").await.map(|_| ())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, Error> {
        let sql = match self.dialect {
            Dialect::Sqlite => {
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name"
            }
            Dialect::Mysql => {
                "SELECT table_name FROM information_schema.tables
                 WHERE table_schema = DATABASE()
                 ORDER BY table_name"
            }
            Dialect::Postgres => {
                "SELECT table_name::text FROM information_schema.tables
                 WHERE table_schema = 'public'
                 ORDER BY table_name"
            }
        };

        let rows: Vec<(String,)> = sqlx::query_as(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    // every table with its columns, in declaration order
    pub async fn table_info(&self) -> Result<Vec<TableInfo>, Error> {
        let rows = match self.dialect {
            Dialect::Postgres => self.postgres_columns().await?,
            Dialect::Sqlite => self.sqlite_columns().await?,
            Dialect::Mysql => self.mysql_columns().await?,
        };

        Ok(group_columns(rows))
    }

    // get table and column info so the model knows what to query
    pub async fn schema(&self) -> Result<String, Error> {
        Ok(format_schema(&self.table_info().await?))
    }

    async fn postgres_columns(&self) -> Result<Vec<(String, String, String)>, Error> {
        sqlx::query_as(
            r#"SELECT table_name::text, column_name::text, data_type::text
               FROM information_schema.columns
               WHERE table_schema = 'public'
               ORDER BY table_name, ordinal_position"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }

    async fn sqlite_columns(&self) -> Result<Vec<(String, String, String)>, Error> {
        let mut result = Vec::new();
        for table in self.list_tables().await? {
            let cols: Vec<(String, String)> =
                sqlx::query_as("SELECT name, type FROM pragma_table_info(?) ORDER BY cid")
                    .bind(&table)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(classify)?;

            for (name, dtype) in cols {
                result.push((table.clone(), name, dtype));
            }
        }

        Ok(result)
    }

    async fn mysql_columns(&self) -> Result<Vec<(String, String, String)>, Error> {
        sqlx::query_as(
            r#"SELECT table_name, column_name, data_type
               FROM information_schema.columns
               WHERE table_schema = DATABASE()
               ORDER BY table_name, ordinal_position"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }

    /// First `limit` rows of a table.
    pub async fn preview(&self, table: &str, limit: usize) -> Result<QueryResult, Error> {
        let sql = format!(
            "SELECT * FROM {} LIMIT {limit}",
            self.dialect.quote_ident(table)
        );
        self.execute(&sql).await
    }

    // run the sql and return results as json
    pub async fn execute(&self, sql: &str) -> Result<QueryResult, Error> {
        let sql = trim_statement(sql);
        let mut conn = self.pool.acquire().await.map_err(Error::Connection)?;

        if !returns_rows(sql) {
            let done = sqlx::query(sql)
                .persistent(false)
                .execute(&mut *conn)
                .await
                .map_err(classify)?;
            debug!(rows_affected = done.rows_affected(), "statement executed");
            return Ok(QueryResult::affected(done.rows_affected()));
        }

        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&mut *conn)
            .await
            .map_err(classify)?;

        debug!(rows = rows.len(), "query executed");

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => statement_columns(&mut conn, sql).await,
        };

        let json_rows: Vec<Vec<serde_json::Value>> = rows
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|i| row_value_to_json(row, i))
                    .collect()
            })
            .collect();

        let row_count = json_rows.len();

        Ok(QueryResult {
            columns,
            rows: json_rows,
            row_count,
            rows_affected: None,
        })
    }
}

impl Dialect {
    fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
        }
    }

    fn quote_ident(&self, ident: &str) -> String {
        let quote = match self {
            Dialect::Mysql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        };
        let escaped = ident.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }
}

// figure out dialect from connection string
fn detect_dialect(url: &str) -> Dialect {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Dialect::Postgres
    } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
        Dialect::Mysql
    } else {
        Dialect::Sqlite
    }
}

// lost connections are connection errors, everything else is the statement's fault
fn classify(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Error::Connection(e),
        _ => Error::Query(e),
    }
}

fn trim_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

fn returns_rows(sql: &str) -> bool {
    const ROW_KEYWORDS: [&str; 8] = [
        "SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "PRAGMA", "VALUES",
    ];

    let body = skip_leading_noise(sql);
    let first = body
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default();

    ROW_KEYWORDS.iter().any(|k| first.eq_ignore_ascii_case(k)) || has_returning(body)
}

// whitespace, comments, and opening parens before the first keyword
fn skip_leading_noise(mut sql: &str) -> &str {
    loop {
        let trimmed = sql.trim_start().trim_start_matches('(');
        let next = if let Some(rest) = trimmed.strip_prefix("--") {
            rest.split_once('\n').map_or("", |(_, after)| after)
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            rest.split_once("*/").map_or("", |(_, after)| after)
        } else {
            trimmed
        };

        if next.len() == sql.len() {
            return sql;
        }
        sql = next;
    }
}

// INSERT/UPDATE/DELETE ... RETURNING, ignoring quoted text
fn has_returning(sql: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut word = String::new();

    for c in sql.chars().chain([' ']) {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None if c.is_alphanumeric() || c == '_' => word.push(c),
            None => {
                if word.eq_ignore_ascii_case("RETURNING") {
                    return true;
                }
                word.clear();
                if matches!(c, '\'' | '"' | '`') {
                    quote = Some(c);
                }
            }
        }
    }

    false
}

// column names for a statement that came back empty
async fn statement_columns(conn: &mut AnyConnection, sql: &str) -> Vec<String> {
    match conn.prepare(sql).await {
        Ok(statement) => statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        Err(e) => {
            debug!(error = %e, "could not describe empty result");
            Vec::new()
        }
    }
}

fn group_columns(rows: Vec<(String, String, String)>) -> Vec<TableInfo> {
    let mut tables: Vec<TableInfo> = Vec::new();

    for (table, column, data_type) in rows {
        let column = ColumnInfo {
            name: column,
            data_type,
        };
        match tables.last_mut() {
            Some(last) if last.name == table => last.columns.push(column),
            _ => tables.push(TableInfo {
                name: table,
                columns: vec![column],
            }),
        }
    }

    tables
}

// turn table info into readable text for the model
fn format_schema(tables: &[TableInfo]) -> String {
    tables
        .iter()
        .map(|table| {
            let mut text = format!("TABLE {} (\n", table.name);
            for column in &table.columns {
                text.push_str(&format!("  {} {}\n", column.name, column.data_type));
            }
            text.push(')');
            text
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// convert database values to json (handling type mismatches gracefully)
fn row_value_to_json(row: &sqlx::any::AnyRow, index: usize) -> serde_json::Value {
    use sqlx::ValueRef;

    // null check first
    if row.try_get_raw(index).map(|v| v.is_null()).unwrap_or(true) {
        return serde_json::Value::Null;
    }

    // try types in order of how common they are
    if let Ok(v) = row.try_get::<String, _>(index) {
        return serde_json::Value::String(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return serde_json::Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<i32, _>(index) {
        return serde_json::Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return serde_json::Number::from_f64(v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return serde_json::Value::Bool(v);
    }

    // give up - the any driver can't decode everything (dates, decimals)
    serde_json::Value::String("<unsupported>".to_string())
}
