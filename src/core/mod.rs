// core logic - model, database, prompt, and the engine tying them together

mod ai;
mod db;
mod engine;
mod extract;
mod prompt;

pub use ai::{Ai, SqlGenerator};
pub use db::{ColumnInfo, Db, QueryResult, TableInfo};
pub use engine::{Answer, QueryEngine};
pub use extract::extract_sql;
pub use prompt::Prompt;
