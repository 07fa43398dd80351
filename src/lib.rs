// gene library - natural language to sql

pub mod cli;
pub mod config;
mod core;
pub mod demo;
mod error;
pub mod output;
pub mod repl;

pub use config::{AiConfig, Backend, Config, DatabaseConfig, Provider, Settings};
pub use core::{
    Ai, Answer, ColumnInfo, Db, Prompt, QueryEngine, QueryResult, SqlGenerator, TableInfo,
    extract_sql,
};
pub use error::Error;
