// command line interface

use crate::repl::Repl;
use crate::{Ai, Config, Db, QueryEngine, Settings, demo, output};
use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gene", version, about = "Ask your database questions in plain english")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// toml file with default settings
    #[arg(long, env = "GENE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// answer one question and exit
    #[arg(long, value_name = "QUESTION", conflicts_with = "sql")]
    nl: Option<String>,

    /// run one sql statement and exit
    #[arg(long, value_name = "QUERY")]
    sql: Option<String>,

    /// print results as json
    #[arg(long, global = true)]
    json: bool,

    /// debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// create and fill the demo tables
    Setup,
    /// ask questions interactively (default)
    Interactive,
    /// run the example questions against the demo tables
    Examples,
    /// check the database connection and model credentials
    Check,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.settings, cli.config.as_deref())?;

    if let Some(question) = cli.nl {
        return ask_once(&config, &question, cli.json).await;
    }
    if let Some(sql) = cli.sql {
        return sql_once(&config, &sql, cli.json).await;
    }

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Setup => setup(&config).await,
        Commands::Interactive => interactive(&config, cli.json).await,
        Commands::Examples => examples(&config).await,
        Commands::Check => check(&config).await,
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "gene=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GENE_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    // stderr so results on stdout stay pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

async fn ask_once(config: &Config, question: &str, json: bool) -> Result<()> {
    let ai = Ai::new(&config.ai)?;
    let db = Db::connect(&config.database).await?;
    let engine = QueryEngine::new(db, Some(ai), config.max_rows).await;

    let answer = engine.execute_natural_query(question).await?;
    if json {
        println!("{}", output::to_json(&answer)?);
    } else {
        println!("SQL: {}\n", answer.sql);
        println!("{}", engine.format_results(&answer.result));
    }

    engine.db().close().await;
    Ok(())
}

async fn sql_once(config: &Config, sql: &str, json: bool) -> Result<()> {
    let db = Db::connect(&config.database).await?;
    let engine: QueryEngine = QueryEngine::new(db, None, config.max_rows).await;

    let result = engine.execute_sql_query(sql).await?;
    if json {
        println!("{}", output::to_json(&result)?);
    } else {
        println!("{}", engine.format_results(&result));
    }

    engine.db().close().await;
    Ok(())
}

async fn setup(config: &Config) -> Result<()> {
    println!("setting up demo tables in {}", config.database.display_url());

    let db = Db::connect(&config.database).await?;
    let inserted = demo::seed(&db).await?;
    let tables = db.list_tables().await?;

    if inserted == 0 {
        println!("demo data already present");
    } else {
        println!("inserted {inserted} rows");
    }
    println!("tables: {}", tables.join(", "));

    db.close().await;
    Ok(())
}

async fn interactive(config: &Config, json: bool) -> Result<()> {
    // no credentials still leaves tables/preview/sql usable
    let ai = match Ai::new(&config.ai) {
        Ok(ai) => Some(ai),
        Err(e) => {
            warn!(error = %e, "natural language queries disabled");
            eprintln!("warning: {e}");
            None
        }
    };

    let db = Db::connect(&config.database).await?;
    let engine = QueryEngine::new(db, ai, config.max_rows).await;

    let mut repl = Repl::new(engine, json);
    repl.run().await?;
    Ok(())
}

async fn examples(config: &Config) -> Result<()> {
    let ai = Ai::new(&config.ai)?;
    let db = Db::connect(&config.database).await?;
    let engine = QueryEngine::new(db, Some(ai), config.max_rows).await;

    for (i, question) in demo::EXAMPLE_QUESTIONS.iter().enumerate() {
        println!("\n{}. {question}", i + 1);
        println!("{}", "-".repeat(40));

        // keep going when one example fails
        let sql = match engine.generate_sql(question).await {
            Ok(sql) => sql,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };
        println!("SQL: {sql}\n");

        match engine.execute_sql_query(&sql).await {
            Ok(result) => println!("{}", engine.format_results(&result)),
            Err(e) => println!("error: {e}"),
        }
    }

    engine.db().close().await;
    Ok(())
}

async fn check(config: &Config) -> Result<()> {
    println!("checking database connection ({})...", config.database.display_url());

    let db = Db::connect(&config.database).await?;
    db.ping().await?;
    let tables = db.list_tables().await?;

    println!("connected to {} database", db.dialect_name());
    let more = if tables.len() > 5 { "..." } else { "" };
    println!(
        "found {} tables: {}{more}",
        tables.len(),
        tables.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
    );

    match Ai::new(&config.ai) {
        Ok(ai) => println!(
            "{} credentials found (model {})",
            ai.provider().name(),
            ai.model()
        ),
        Err(e) => println!("model api not ready: {e}"),
    }

    db.close().await;
    Ok(())
}
