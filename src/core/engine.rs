// query engine - question in, rows out

use super::ai::{Ai, SqlGenerator};
use super::db::{Db, QueryResult, TableInfo};
use super::extract::extract_sql;
use super::prompt::Prompt;
use crate::{Error, output};
use serde::Serialize;
use tracing::{info, warn};

pub struct QueryEngine<G = Ai> {
    db: Db,
    generator: Option<G>,
    schema: String,
    max_rows: usize,
}

/// Generated sql together with what it returned.
#[derive(Debug, Serialize)]
pub struct Answer {
    pub sql: String,
    pub result: QueryResult,
}

impl<G: SqlGenerator> QueryEngine<G> {
    /// Without a generator only raw sql, tables and previews work.
    pub async fn new(db: Db, generator: Option<G>, max_rows: usize) -> Self {
        let schema = load_schema(&db).await;
        Self {
            db,
            generator,
            schema,
            max_rows,
        }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn can_generate(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn refresh_schema(&mut self) {
        self.schema = load_schema(&self.db).await;
    }

    /// Ask the model for sql and pull the statement out of its reply.
    pub async fn generate_sql(&self, question: &str) -> Result<String, Error> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| Error::Auth("no model credentials configured".into()))?;

        let prompt = Prompt::new(question, &self.schema, self.db.dialect_name());
        let response = generator.complete(&prompt).await?;

        let sql = extract_sql(&response).ok_or_else(|| {
            Error::Generation(format!("no sql statement in model response: {}", response.trim()))
        })?;

        info!(%sql, "generated sql");
        Ok(sql)
    }

    pub async fn execute_natural_query(&self, question: &str) -> Result<Answer, Error> {
        let sql = self.generate_sql(question).await?;
        let result = self.execute_sql_query(&sql).await?;
        Ok(Answer { sql, result })
    }

    pub async fn execute_sql_query(&self, sql: &str) -> Result<QueryResult, Error> {
        self.db.execute(sql).await
    }

    pub async fn list_tables(&self) -> Result<Vec<TableInfo>, Error> {
        self.db.table_info().await
    }

    pub async fn preview(&self, table: &str, limit: usize) -> Result<QueryResult, Error> {
        self.db.preview(table, limit).await
    }

    pub fn format_results(&self, result: &QueryResult) -> String {
        output::format_results(result, self.max_rows)
    }
}

async fn load_schema(db: &Db) -> String {
    match db.schema().await {
        Ok(schema) => schema,
        Err(e) => {
            warn!(error = %e, "could not load schema, prompting without it");
            String::new()
        }
    }
}
