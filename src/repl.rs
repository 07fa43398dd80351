// interactive prompt - one command at a time until quit

use crate::{Ai, Error, QueryEngine, SqlGenerator, output};
use miette::Diagnostic;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use tracing::debug;

pub const DEFAULT_PREVIEW_LIMIT: usize = 5;

const HELP: &str = "\
Type a question in plain english, or:
  tables                  list tables and their columns
  preview <table> [n]     show the first n rows of a table (default 5)
  sql <query>             run sql directly
  help                    show this message
  quit                    exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Quit,
    Help,
    Tables,
    Preview { table: Option<String>, limit: usize },
    Sql(Option<String>),
    Ask(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "quit" | "exit" if rest.is_empty() => Command::Quit,
            "help" if rest.is_empty() => Command::Help,
            "tables" if rest.is_empty() => Command::Tables,
            "preview" => {
                let mut parts = rest.split_whitespace();
                let table = parts.next().map(str::to_string);
                match parts.next().map(str::parse) {
                    None => Command::Preview {
                        table,
                        limit: DEFAULT_PREVIEW_LIMIT,
                    },
                    Some(Ok(limit)) => Command::Preview { table, limit },
                    // a bad limit gets the usage line
                    Some(Err(_)) => Command::Preview {
                        table: None,
                        limit: DEFAULT_PREVIEW_LIMIT,
                    },
                }
            }
            "sql" => Command::Sql((!rest.is_empty()).then(|| rest.to_string())),
            _ => Command::Ask(line.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Repl<G = Ai> {
    engine: QueryEngine<G>,
    json: bool,
}

impl<G: SqlGenerator> Repl<G> {
    pub fn new(engine: QueryEngine<G>, json: bool) -> Self {
        Self { engine, json }
    }

    pub async fn run(&mut self) -> Result<(), Error> {
        let config = rustyline::Config::builder().auto_add_history(true).build();
        let mut editor = DefaultEditor::with_config(config)?;
        let mut stdout = io::stdout();

        println!("gene - ask your {} database anything", self.engine.db().dialect_name());
        println!("{HELP}");
        if !self.engine.can_generate() {
            println!("(no model credentials: only tables, preview, and sql work)");
        }

        loop {
            match editor.readline("\ngene> ") {
                Ok(line) => {
                    if self.handle_line(&line, &mut stdout).await? == Flow::Quit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        println!("bye");
        Ok(())
    }

    /// Run one line of input, printing results or the error to `out`.
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow, Error> {
        let command = Command::parse(line);
        debug!(?command, "dispatch");

        match self.dispatch(command, out).await {
            Ok(flow) => Ok(flow),
            Err(e @ Error::Io(_)) => Err(e),
            Err(e) => {
                writeln!(out, "error: {e}")?;
                if let Some(help) = e.help() {
                    writeln!(out, "  help: {help}")?;
                }
                Ok(Flow::Continue)
            }
        }
    }

    async fn dispatch<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow, Error> {
        match command {
            Command::Empty => {}
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Tables => {
                let tables = self.engine.list_tables().await?;
                writeln!(out, "{}", output::format_tables(&tables))?;
            }
            Command::Preview { table: None, .. } => {
                writeln!(out, "usage: preview <table> [limit]")?
            }
            Command::Preview {
                table: Some(table),
                limit,
            } => {
                let result = self.engine.preview(&table, limit).await?;
                self.print_result(&result, out)?;
            }
            Command::Sql(None) => writeln!(out, "usage: sql <query>")?,
            Command::Sql(Some(sql)) => {
                let result = self.engine.execute_sql_query(&sql).await?;
                self.print_result(&result, out)?;
                if changes_schema(&sql) {
                    self.engine.refresh_schema().await;
                }
            }
            Command::Ask(question) => {
                let sql = self.engine.generate_sql(&question).await?;
                writeln!(out, "SQL: {sql}\n")?;
                let result = self.engine.execute_sql_query(&sql).await?;
                self.print_result(&result, out)?;
            }
        }

        Ok(Flow::Continue)
    }

    fn print_result<W: Write>(&self, result: &crate::QueryResult, out: &mut W) -> Result<(), Error> {
        let text = if self.json {
            output::to_json(result)?
        } else {
            self.engine.format_results(result)
        };
        writeln!(out, "{text}")?;
        Ok(())
    }
}

// ddl changes what the model should know about
fn changes_schema(sql: &str) -> bool {
    let first = sql.split_whitespace().next().unwrap_or_default();
    ["CREATE", "ALTER", "DROP", "RENAME"]
        .iter()
        .any(|k| first.eq_ignore_ascii_case(k))
}
