//! Per-strategy load handlers.
//!
//! Each group's bytes are already registered when these run. A handler
//! issues the DDL for its strategy and returns the relations it created.

use crate::engine::{quote_ident, quote_literal, Connection};
use crate::error::{QuarryError, Result};
use crate::ingest::detect::{sanitize, table_name_for_file, FileFormat, LoadStrategy};
use crate::ingest::group::FileGroup;
use crate::table::{describe_columns, TableInfo};
use log::{debug, info};
use std::collections::HashSet;

/// Relation names created so far by one ingestion call.
///
/// Engine identifiers are case-insensitive, so names are compared folded.
#[derive(Debug, Default)]
pub struct ClaimedNames {
    taken: HashSet<String>,
}

impl ClaimedNames {
    /// Reserve `base`, or the first free `base_2`, `base_3`, ... after it.
    pub fn claim(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 2;
        while !self.taken.insert(candidate.to_lowercase()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        if candidate != base {
            debug!("relation '{}' already created in this call, using '{}'", base, candidate);
        }
        candidate
    }
}

/// Create the relations for one group according to its strategy.
pub fn load_group(
    conn: &dyn Connection,
    group: &FileGroup,
    strategy: LoadStrategy,
    names: &mut ClaimedNames,
) -> Result<Vec<TableInfo>> {
    let label = strategy.source_label(group);
    match strategy {
        LoadStrategy::DeltaFolder => load_delta_folder(conn, group, &label, names).map(|t| vec![t]),
        LoadStrategy::ParquetFolder => {
            load_parquet_folder(conn, group, &label, names).map(|t| vec![t])
        }
        LoadStrategy::Single(FileFormat::Sqlite) => load_sqlite(conn, group, &label, names),
        LoadStrategy::Single(format) => {
            load_single(conn, group, format, &label, names).map(|t| vec![t])
        }
        LoadStrategy::Unsupported => {
            debug!("no loader for '{}', skipping", group.name);
            Ok(Vec::new())
        }
    }
}

fn load_delta_folder(
    conn: &dyn Connection,
    group: &FileGroup,
    label: &str,
    names: &mut ClaimedNames,
) -> Result<TableInfo> {
    conn.install_capability("delta");
    let source = format!("delta_scan({})", quote_literal(&conn.file_reference(&group.name)));
    create_table_as(conn, &names.claim(&sanitize(&group.name)), &source, label)
}

fn load_parquet_folder(
    conn: &dyn Connection,
    group: &FileGroup,
    label: &str,
    names: &mut ClaimedNames,
) -> Result<TableInfo> {
    let pattern = format!("{}/*.parquet", conn.file_reference(&group.name));
    create_table_as(conn, &names.claim(&sanitize(&group.name)), &quote_literal(&pattern), label)
}

fn load_single(
    conn: &dyn Connection,
    group: &FileGroup,
    format: FileFormat,
    label: &str,
    names: &mut ClaimedNames,
) -> Result<TableInfo> {
    let member = single_member(group)?;
    debug!("loading '{}' as {}", member.virtual_path(), format.as_str());
    let path = quote_literal(&conn.file_reference(member.virtual_path()));
    let source = match format {
        FileFormat::Xlsx => {
            conn.install_capability("excel");
            format!("read_xlsx({})", path)
        }
        FileFormat::Csv | FileFormat::Json | FileFormat::Parquet | FileFormat::Sqlite => path,
    };
    create_table_as(conn, &names.claim(&table_name_for_file(member.name())), &source, label)
}

/// Attach a SQLite file and expose each inner table as a view.
fn load_sqlite(
    conn: &dyn Connection,
    group: &FileGroup,
    label: &str,
    names: &mut ClaimedNames,
) -> Result<Vec<TableInfo>> {
    let member = single_member(group)?;
    let schema = sanitize(&group.name);
    conn.install_capability("sqlite");
    conn.execute(&format!(
        "ATTACH IF NOT EXISTS {} AS {} (TYPE sqlite)",
        quote_literal(&conn.file_reference(member.virtual_path())),
        quote_ident(&schema)
    ))?;

    let inner = conn.execute(&format!(
        "SELECT table_name FROM information_schema.tables WHERE table_catalog = {} ORDER BY table_name",
        quote_literal(&schema)
    ))?;

    let mut views = Vec::new();
    for table in inner.strings(0) {
        let view = names.claim(&sanitize(&format!("{}_{}", schema, table)));
        conn.execute(&format!(
            "CREATE OR REPLACE VIEW {} AS SELECT * FROM {}.{}",
            quote_ident(&view),
            quote_ident(&schema),
            quote_ident(&table)
        ))?;
        let columns = describe_columns(conn, &view)?;
        views.push(TableInfo::view(view, columns, label));
    }

    info!("attached '{}' with {} tables", group.name, views.len());
    Ok(views)
}

fn create_table_as(conn: &dyn Connection, table: &str, source: &str, label: &str) -> Result<TableInfo> {
    conn.execute(&format!(
        "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}",
        quote_ident(table),
        source
    ))?;
    let columns = describe_columns(conn, table)?;
    info!("created table '{}' ({} columns)", table, columns.len());
    Ok(TableInfo::table(table, columns, label))
}

fn single_member(group: &FileGroup) -> Result<&crate::ingest::InputFile> {
    group
        .members
        .first()
        .ok_or_else(|| QuarryError::Other(format!("group '{}' has no files", group.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedEngine;
    use crate::engine::{Engine, QueryOutput};
    use crate::ingest::detect::classify;
    use crate::ingest::group::group_files;
    use crate::ingest::InputFile;
    use serde_json::json;

    fn load(engine: &ScriptedEngine, files: Vec<InputFile>) -> Result<Vec<TableInfo>> {
        let group = group_files(files).remove(0);
        let conn = engine.connect()?;
        load_group(conn.as_ref(), &group, classify(&group), &mut ClaimedNames::default())
    }

    #[test]
    fn test_csv_creates_table_from_stem() {
        let engine = ScriptedEngine::new();
        engine.describe("sales", &[("id", "BIGINT")]);

        let tables = load(&engine, vec![InputFile::from_bytes("sales.csv", Vec::new())]).unwrap();

        assert_eq!(
            engine.statements()[0],
            "CREATE OR REPLACE TABLE \"sales\" AS SELECT * FROM 'sales.csv'"
        );
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "sales");
        assert_eq!(tables[0].source_file, "sales.csv");
        assert!(!tables[0].is_view);
        assert_eq!(tables[0].columns.len(), 1);
    }

    #[test]
    fn test_xlsx_installs_excel_first() {
        let engine = ScriptedEngine::new();
        load(&engine, vec![InputFile::from_bytes("Q1 budget.xlsx", Vec::new())]).unwrap();

        let statements = engine.statements();
        assert_eq!(statements[0], "INSTALL excel");
        assert_eq!(statements[1], "LOAD excel");
        assert_eq!(
            statements[2],
            "CREATE OR REPLACE TABLE \"Q1_budget\" AS SELECT * FROM read_xlsx('Q1 budget.xlsx')"
        );
    }

    #[test]
    fn test_delta_folder_reads_folder_root() {
        let engine = ScriptedEngine::new();
        let files = vec![
            InputFile::from_bytes("part-0.parquet", Vec::new())
                .with_relative_path("events/part-0.parquet"),
            InputFile::from_bytes("0.json", Vec::new())
                .with_relative_path("events/_delta_log/0.json"),
        ];

        let tables = load(&engine, files).unwrap();

        assert!(engine
            .statements()
            .contains(&"CREATE OR REPLACE TABLE \"events\" AS SELECT * FROM delta_scan('events')".to_string()));
        assert_eq!(tables[0].source_file, "events (Delta)");
    }

    #[test]
    fn test_delta_install_failure_is_swallowed() {
        let engine = ScriptedEngine::new();
        engine.fail_on("INSTALL delta", "offline");
        let files = vec![InputFile::from_bytes("0.json", Vec::new())
            .with_relative_path("events/_delta_log/0.json")];

        let tables = load(&engine, files).unwrap();
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn test_sqlite_exposes_inner_tables_as_views() {
        let engine = ScriptedEngine::new();
        engine.respond(
            "information_schema.tables WHERE table_catalog = 'legacy_db'",
            QueryOutput::new(
                vec!["table_name".to_string()],
                vec![vec![json!("orders")], vec![json!("users")]],
            ),
        );
        engine.describe("legacy_db_users", &[("id", "BIGINT"), ("email", "VARCHAR")]);
        engine.describe("legacy_db_orders", &[("id", "BIGINT")]);

        let tables = load(&engine, vec![InputFile::from_bytes("legacy.db", Vec::new())]).unwrap();

        let statements = engine.statements();
        assert!(statements.contains(&"ATTACH IF NOT EXISTS 'legacy.db' AS \"legacy_db\" (TYPE sqlite)".to_string()));
        assert!(statements.contains(
            &"CREATE OR REPLACE VIEW \"legacy_db_users\" AS SELECT * FROM \"legacy_db\".\"users\"".to_string()
        ));
        assert!(!statements.iter().any(|s| s.contains("CREATE OR REPLACE TABLE")));

        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["legacy_db_orders", "legacy_db_users"]);
        assert!(tables.iter().all(|t| t.is_view));
        assert!(tables.iter().all(|t| t.source_file == "legacy.db (SQLite)"));
        assert_eq!(tables[1].columns.len(), 2);
    }

    #[test]
    fn test_unsupported_file_issues_nothing() {
        let engine = ScriptedEngine::new();
        let tables = load(&engine, vec![InputFile::from_bytes("notes.txt", Vec::new())]).unwrap();
        assert!(tables.is_empty());
        assert!(engine.statements().is_empty());
    }

    #[test]
    fn test_claimed_names_get_suffixes() {
        let mut names = ClaimedNames::default();
        assert_eq!(names.claim("a"), "a");
        assert_eq!(names.claim("A"), "A_2");
        assert_eq!(names.claim("a"), "a_3");
        assert_eq!(names.claim("a_2"), "a_2_2");
        assert_eq!(names.claim("b"), "b");
    }

    #[test]
    fn test_engine_rejection_propagates() {
        let engine = ScriptedEngine::new();
        engine.fail_on("CREATE OR REPLACE TABLE", "Invalid Input Error: not a parquet file");
        let err = load(&engine, vec![InputFile::from_bytes("bad.parquet", Vec::new())]).unwrap_err();
        assert!(err.to_string().contains("not a parquet file"));
    }
}
