// prompt text sent to the model

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(question: &str, schema: &str, dialect: &str) -> Self {
        let schema = if schema.trim().is_empty() {
            "(schema unavailable)"
        } else {
            schema
        };

        let system = format!(
            r#"You are a {dialect} expert. Convert natural language questions to SQL.

Database schema:
{schema}

Rules:
- Return ONLY the SQL query, no explanations or markdown
- Use proper {dialect} syntax
- Table and column names are case sensitive, use them exactly as in the schema
- If the question is unclear, make reasonable assumptions based on the schema
- For aggregations, include appropriate GROUP BY clauses
- Use JOIN when querying multiple tables
- Add a reasonable LIMIT for large result sets (max 100 rows)

Example:
Question: How many users are there?
SQL: SELECT COUNT(*) AS user_count FROM users;"#
        );

        Self {
            system,
            user: format!("Convert this to SQL: {}", question.trim()),
        }
    }
}
