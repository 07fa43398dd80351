use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("Connection error: {0}")]
    #[diagnostic(
        code(gene::connection),
        help("check the database settings (DATABASE_URL or DB_HOST/DB_USER/DB_NAME)")
    )]
    Connection(#[source] sqlx::Error),

    #[error("Query error: {0}")]
    #[diagnostic(code(gene::query))]
    Query(#[source] sqlx::Error),

    #[error("Missing API key. Set {0} or pass --api-key")]
    #[diagnostic(code(gene::auth))]
    MissingApiKey(&'static str),

    #[error("Authentication failed: {0}")]
    #[diagnostic(code(gene::auth), help("check the api key or gateway token"))]
    Auth(String),

    #[error("SQL generation failed: {0}")]
    #[diagnostic(code(gene::generation))]
    Generation(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(gene::config))]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}
