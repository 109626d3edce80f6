//! Relation metadata shared by ingestion, catalog refresh and the graph.

use crate::engine::{quote_ident, scalar_to_string, Connection};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Source label for views the engine knows no file for.
pub const VIEWS_LABEL: &str = "(views)";

/// Source label for tables the engine knows no file for.
pub const DATABASE_LABEL: &str = "(database)";

/// Whether a source label is one of the synthetic sentinels.
pub fn is_sentinel_label(label: &str) -> bool {
    label.is_empty() || label == VIEWS_LABEL || label == DATABASE_LABEL
}

/// One column of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    /// Column name.
    pub column_name: String,
    /// Declared type as reported by the engine.
    pub column_type: String,
}

/// A table or view in one catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    /// Relation name, unique within a snapshot.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnInfo>,
    /// Display label for where the relation came from.
    pub source_file: String,
    /// Whether the relation is a view.
    pub is_view: bool,
    /// Relations a view reads from. Unset when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<BTreeSet<String>>,
}

impl TableInfo {
    /// A base table.
    pub fn table(name: impl Into<String>, columns: Vec<ColumnInfo>, source_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            source_file: source_file.into(),
            is_view: false,
            dependencies: None,
        }
    }

    /// A view without known dependencies.
    pub fn view(name: impl Into<String>, columns: Vec<ColumnInfo>, source_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            source_file: source_file.into(),
            is_view: true,
            dependencies: None,
        }
    }
}

/// Fetch column metadata for a relation, preserving declaration order.
pub fn describe_columns(conn: &dyn Connection, relation: &str) -> Result<Vec<ColumnInfo>> {
    let output = conn.execute(&format!("DESCRIBE {}", quote_ident(relation)))?;
    let name_idx = output.column_index("column_name").unwrap_or(0);
    let type_idx = output.column_index("column_type").unwrap_or(1);

    Ok(output
        .rows
        .iter()
        .filter_map(|row| {
            let column_name = row.get(name_idx).and_then(scalar_to_string)?;
            let column_type = row
                .get(type_idx)
                .and_then(scalar_to_string)
                .unwrap_or_default();
            Some(ColumnInfo {
                column_name,
                column_type,
            })
        })
        .collect())
}
