// output formatting - aligned text tables or raw json

use crate::{Error, QueryResult, TableInfo};
use serde::Serialize;

// cap so one long value doesn't blow up the whole table
const MAX_WIDTH: usize = 40;

/// Render a result as a fixed-width text table, showing at most `max_rows` rows.
pub fn format_results(result: &QueryResult, max_rows: usize) -> String {
    if let Some(n) = result.rows_affected {
        return format!("Query OK, {n} row(s) affected.");
    }

    if result.rows.is_empty() {
        return "No results found.".to_string();
    }

    let shown = &result.rows[..result.rows.len().min(max_rows)];

    // figure out column widths
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in shown {
        for (i, val) in row.iter().enumerate() {
            let len = format_value(val).chars().count();
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(len);
            }
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_WIDTH);
    }

    let mut lines = Vec::with_capacity(shown.len() + 4);

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(&truncate(c), *w))
        .collect();
    lines.push(header.join(" | ").trim_end().to_string());

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    lines.push(sep.join("-+-"));

    for row in shown {
        let formatted: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| pad(&truncate(&format_value(v)), *w))
            .collect();
        lines.push(formatted.join(" | ").trim_end().to_string());
    }

    lines.push(String::new());
    let total = result.rows.len();
    if total > shown.len() {
        lines.push(format!("... showing {} of {total} rows", shown.len()));
    } else {
        lines.push(format!("Total rows: {total}"));
    }

    lines.join("\n")
}

/// Table names with their columns, one table per line.
pub fn format_tables(tables: &[TableInfo]) -> String {
    if tables.is_empty() {
        return "No tables found.".to_string();
    }

    let mut out = format!("Available tables ({}):", tables.len());
    for table in tables {
        let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        out.push_str(&format!("\n  {}: {}", table.name, columns.join(", ")));
    }
    out
}

// raw json for scripts
pub fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn format_value(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => val.to_string(),
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() > MAX_WIDTH {
        let head: String = s.chars().take(MAX_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn pad(s: &str, width: usize) -> String {
    format!("{s:width$}")
}
