//! Engine integration layer.
//!
//! The analytical engine is reached only through the [`Engine`] and
//! [`Connection`] traits: register raw bytes under a virtual path, run a
//! statement, and install an optional capability. Everything else
//! (introspection included) goes through `execute`.

#[cfg(feature = "duckdb")]
pub mod duckdb_engine;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::Result;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// Rows and column names returned by one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOutput {
    /// Column names, in result order.
    pub columns: Vec<String>,
    /// Rows of scalar values aligned to `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl QueryOutput {
    /// Build an output from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Index of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Iterate the string values of one column, skipping nulls.
    pub fn strings(&self, index: usize) -> impl Iterator<Item = String> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(index).and_then(scalar_to_string))
    }
}

/// Result of running user SQL. Never an error at the Rust level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Column names.
    pub columns: Vec<String>,
    /// Result rows.
    pub rows: Vec<Vec<Value>>,
    /// Engine error message, when the statement failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Elapsed wall-clock time in milliseconds.
    pub time_ms: f64,
}

/// A handle to the analytical engine that hands out connections.
pub trait Engine {
    /// Acquire a dedicated connection. It is released when dropped.
    fn connect(&self) -> Result<Box<dyn Connection + '_>>;
}

/// One live connection to the engine.
pub trait Connection {
    /// Register raw bytes under a virtual path. Re-registering replaces.
    fn register_bytes(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Execute one statement and collect its rows.
    fn execute(&self, sql: &str) -> Result<QueryOutput>;

    /// The string SQL should quote to read a registered virtual path.
    fn file_reference(&self, path: &str) -> String {
        path.to_string()
    }

    /// Install and load an optional engine extension.
    ///
    /// Best effort: the capability may already be present, and if it is
    /// really missing the statement that needs it fails more specifically.
    fn install_capability(&self, name: &str) {
        for sql in [format!("INSTALL {}", name), format!("LOAD {}", name)] {
            if let Err(e) = self.execute(&sql) {
                warn!("capability '{}' not installed ({}): {}", name, sql, e);
                return;
            }
        }
        debug!("capability '{}' ready", name);
    }
}

/// Run user SQL, capturing failures as a result-level error.
pub fn run_query(conn: &dyn Connection, sql: &str) -> QueryResult {
    let start = Instant::now();
    let outcome = conn.execute(sql);
    let time_ms = start.elapsed().as_secs_f64() * 1000.0;

    match outcome {
        Ok(output) => QueryResult {
            columns: output.columns,
            rows: output.rows,
            error: None,
            time_ms,
        },
        Err(e) => {
            debug!("query failed after {:.1}ms: {}", time_ms, e);
            QueryResult {
                columns: Vec::new(),
                rows: Vec::new(),
                error: Some(e.to_string()),
                time_ms,
            }
        }
    }
}

/// Quote an identifier with double quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal with single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a scalar as text. Nulls have no text.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
