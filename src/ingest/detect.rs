//! Format detection and load-strategy classification.
//!
//! Table-driven extension mapping. Unknown extensions return None, never
//! infer from content.

use super::group::{FileGroup, GroupKind};
use std::path::Path;

/// Single-file formats the engine can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values (.csv)
    Csv,
    /// JSON or newline-delimited JSON (.json)
    Json,
    /// Apache Parquet (.parquet)
    Parquet,
    /// Excel workbook (.xlsx)
    Xlsx,
    /// SQLite database container (.sqlite, .db)
    Sqlite,
}

impl FileFormat {
    /// Convert format to string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Parquet => "parquet",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Sqlite => "sqlite",
        }
    }
}

/// How one group is turned into relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Folder holding a `_delta_log` directory.
    DeltaFolder,
    /// Folder made only of parquet files.
    ParquetFolder,
    /// One file of a known format.
    Single(FileFormat),
    /// Anything else. Loads nothing.
    Unsupported,
}

impl LoadStrategy {
    /// Source label recorded for relations created by this strategy.
    pub fn source_label(&self, group: &FileGroup) -> String {
        match self {
            LoadStrategy::DeltaFolder => format!("{} (Delta)", group.name),
            LoadStrategy::ParquetFolder => format!("{} (Parquet Folder)", group.name),
            LoadStrategy::Single(FileFormat::Sqlite) => format!("{} (SQLite)", group.name),
            LoadStrategy::Single(_) | LoadStrategy::Unsupported => group.name.clone(),
        }
    }
}

/// Detect a file format from a file name or path.
///
/// Extensions are matched case-insensitively.
///
/// # Examples
///
/// ```
/// # use quarry::ingest::detect::{detect_format, FileFormat};
/// assert_eq!(detect_format("sales.csv"), Some(FileFormat::Csv));
/// assert_eq!(detect_format("legacy.DB"), Some(FileFormat::Sqlite));
/// assert_eq!(detect_format("notes.txt"), None);
/// ```
pub fn detect_format(name: &str) -> Option<FileFormat> {
    let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();

    let format = match extension.as_str() {
        "csv" => FileFormat::Csv,
        "json" => FileFormat::Json,
        "parquet" => FileFormat::Parquet,
        "xlsx" => FileFormat::Xlsx,
        "sqlite" | "db" => FileFormat::Sqlite,
        _ => return None,
    };

    Some(format)
}

/// Pick the load strategy for a group.
pub fn classify(group: &FileGroup) -> LoadStrategy {
    match group.kind {
        GroupKind::Folder => {
            let is_delta = group
                .members
                .iter()
                .any(|m| m.virtual_path().split('/').any(|s| s == "_delta_log"));
            if is_delta {
                return LoadStrategy::DeltaFolder;
            }

            let all_parquet = !group.members.is_empty()
                && group
                    .members
                    .iter()
                    .all(|m| detect_format(m.name()) == Some(FileFormat::Parquet));
            if all_parquet {
                LoadStrategy::ParquetFolder
            } else {
                LoadStrategy::Unsupported
            }
        }
        GroupKind::File => group
            .members
            .first()
            .and_then(|m| detect_format(m.name()))
            .map(LoadStrategy::Single)
            .unwrap_or(LoadStrategy::Unsupported),
    }
}

/// Turn a name into a relation identifier.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Table name for a single file: its sanitized stem.
pub fn table_name_for_file(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(name);
    sanitize(stem)
}
