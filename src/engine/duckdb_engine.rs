//! DuckDB-backed engine.
//!
//! Registered bytes are staged on disk beneath a private directory that
//! lives as long as the engine; SQL reads them through their absolute
//! staged path.

use super::{Connection, Engine, QueryOutput};
use crate::error::{QuarryError, Result};
use chrono::{DateTime, NaiveTime, Utc};
use duckdb::types::{TimeUnit, Value as DuckValue};
use log::{debug, trace};
use serde_json::{json, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;

/// Embedded DuckDB database plus its file staging area.
pub struct DuckDbEngine {
    db: duckdb::Connection,
    staging: TempDir,
}

impl DuckDbEngine {
    /// Open an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = duckdb::Connection::open_in_memory()?;
        Self::with_connection(db)
    }

    /// Open or create a database file.
    pub fn open(path: &Path) -> Result<Self> {
        let db = duckdb::Connection::open(path)?;
        Self::with_connection(db)
    }

    fn with_connection(db: duckdb::Connection) -> Result<Self> {
        let staging = tempfile::Builder::new()
            .prefix("quarry-staging-")
            .tempdir()
            .map_err(|e| QuarryError::Io {
                path: std::env::temp_dir(),
                source: e,
            })?;
        debug!("staging registered files under {}", staging.path().display());
        Ok(Self { db, staging })
    }
}

impl Engine for DuckDbEngine {
    fn connect(&self) -> Result<Box<dyn Connection + '_>> {
        let conn = self.db.try_clone()?;
        trace!("connection acquired");
        Ok(Box::new(DuckDbConnection {
            conn,
            staging: self.staging.path(),
        }))
    }
}

struct DuckDbConnection<'a> {
    conn: duckdb::Connection,
    staging: &'a Path,
}

impl DuckDbConnection<'_> {
    fn staged_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(QuarryError::InvalidPath(path.to_string()));
        }
        Ok(self.staging.join(relative))
    }
}

impl Connection for DuckDbConnection<'_> {
    fn register_bytes(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let target = self.staged_path(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| QuarryError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&target, bytes).map_err(|e| QuarryError::Io {
            path: target.clone(),
            source: e,
        })?;
        trace!("registered {} ({} bytes)", path, bytes.len());
        Ok(())
    }

    fn execute(&self, sql: &str) -> Result<QueryOutput> {
        debug!("execute: {}", sql);
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let columns = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let value: DuckValue = row.get(i)?;
                values.push(to_json(value));
            }
            out.push(values);
        }

        Ok(QueryOutput::new(columns, out))
    }

    fn file_reference(&self, path: &str) -> String {
        self.staging.join(path).to_string_lossy().replace('\\', "/")
    }
}

impl Drop for DuckDbConnection<'_> {
    fn drop(&mut self) {
        trace!("connection released");
    }
}

/// Convert an engine scalar to a JSON value.
///
/// Temporal values become ISO 8601 text, decimals keep their exact digits
/// as text and blobs become lowercase hex.
fn to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(v) => Value::from(v),
        DuckValue::SmallInt(v) => Value::from(v),
        DuckValue::Int(v) => Value::from(v),
        DuckValue::BigInt(v) => Value::from(v),
        DuckValue::UTinyInt(v) => Value::from(v),
        DuckValue::USmallInt(v) => Value::from(v),
        DuckValue::UInt(v) => Value::from(v),
        DuckValue::UBigInt(v) => Value::from(v),
        DuckValue::HugeInt(v) => Value::String(v.to_string()),
        DuckValue::Float(v) => Value::from(f64::from(v)),
        DuckValue::Double(v) => Value::from(v),
        DuckValue::Decimal(d) => Value::String(d.to_string()),
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::String(s),
        DuckValue::Blob(bytes) => Value::String(bytes.iter().map(|b| format!("{:02x}", b)).collect()),
        DuckValue::Date32(days) => text_or_null(
            DateTime::<Utc>::from_timestamp(i64::from(days) * 86_400, 0).map(|dt| dt.date_naive().to_string()),
        ),
        DuckValue::Time64(unit, v) => {
            let micros = to_micros(unit, v);
            text_or_null(
                NaiveTime::from_num_seconds_from_midnight_opt(
                    (micros / 1_000_000) as u32,
                    ((micros % 1_000_000) * 1_000) as u32,
                )
                .map(|t| t.format("%H:%M:%S%.f").to_string()),
            )
        }
        DuckValue::Timestamp(unit, v) => {
            let micros = to_micros(unit, v);
            text_or_null(
                DateTime::<Utc>::from_timestamp(
                    micros.div_euclid(1_000_000),
                    (micros.rem_euclid(1_000_000) * 1_000) as u32,
                )
                .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            )
        }
        DuckValue::Interval { months, days, nanos } => json!({
            "months": months,
            "days": days,
            "micros": nanos / 1_000,
        }),
        DuckValue::List(items) => Value::Array(items.into_iter().map(to_json).collect()),
        // Struct, map and union values.
        other => Value::String(format!("{:?}", other)),
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn text_or_null(text: Option<String>) -> Value {
    text.map(Value::String).unwrap_or(Value::Null)
}
