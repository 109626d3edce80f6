//! Catalog introspection.
//!
//! Rebuilds the relation list purely from the engine's own metadata:
//! the information schema for names and kinds, `DESCRIBE` for columns and
//! the stored view text for view dependencies.

pub mod references;

use crate::engine::{quote_literal, scalar_to_string, Connection, Engine};
use crate::error::Result;
use crate::table::{describe_columns, is_sentinel_label, TableInfo, DATABASE_LABEL, VIEWS_LABEL};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

pub use references::extract_referenced_names;

const LIST_RELATIONS_SQL: &str = "SELECT table_name, table_type FROM information_schema.tables \
     WHERE table_schema = 'main' AND table_catalog = current_database() \
     ORDER BY table_name";

/// Enumerate every relation in the working schema.
///
/// Source labels are left blank; see [`merge_source_labels`]. A relation
/// that cannot be described keeps empty `columns`, and a view whose
/// definition cannot be read keeps `dependencies` unset.
pub fn list_relations(engine: &dyn Engine) -> Result<Vec<TableInfo>> {
    let conn = engine.connect()?;
    let listing = conn.execute(LIST_RELATIONS_SQL)?;

    let relations: Vec<(String, bool)> = listing
        .rows
        .iter()
        .filter_map(|row| {
            let name = row.first().and_then(scalar_to_string)?;
            let kind = row.get(1).and_then(scalar_to_string).unwrap_or_default();
            Some((name, kind.eq_ignore_ascii_case("VIEW")))
        })
        .collect();

    let mut tables = Vec::with_capacity(relations.len());
    for (name, is_view) in &relations {
        let columns = describe_columns(conn.as_ref(), name).unwrap_or_else(|e| {
            warn!("could not describe '{}': {}", name, e);
            Vec::new()
        });
        let mut info = if *is_view {
            TableInfo::view(name.clone(), columns, "")
        } else {
            TableInfo::table(name.clone(), columns, "")
        };

        if *is_view {
            match view_definition(conn.as_ref(), name) {
                Ok(Some(sql)) => info.dependencies = Some(resolve_dependencies(name, &sql, &relations)),
                Ok(None) => warn!("no stored definition for view '{}'", name),
                Err(e) => warn!("could not read definition of view '{}': {}", name, e),
            }
        }
        tables.push(info);
    }

    debug!("catalog lists {} relations", tables.len());
    Ok(tables)
}

/// Stored defining SQL of a view, if the engine has one.
pub fn view_definition(conn: &dyn Connection, view: &str) -> Result<Option<String>> {
    let output = conn.execute(&format!(
        "SELECT sql FROM duckdb_views() WHERE view_name = {} AND database_name = current_database()",
        quote_literal(view)
    ))?;
    Ok(output.rows.first().and_then(|r| r.first()).and_then(scalar_to_string))
}

/// Referenced names that are relations of this snapshot, in catalog spelling.
fn resolve_dependencies(view: &str, sql: &str, relations: &[(String, bool)]) -> BTreeSet<String> {
    let known: HashMap<String, &str> = relations
        .iter()
        .map(|(name, _)| (name.to_lowercase(), name.as_str()))
        .collect();

    extract_referenced_names(sql)
        .into_iter()
        .filter_map(|r| known.get(&r.to_lowercase()).map(|n| n.to_string()))
        .filter(|n| n != view)
        .collect()
}

/// Fill in source labels for a fresh snapshot from the previous one.
///
/// A relation keeps its previous label unless that was a sentinel; new
/// views are labelled `(views)` and new tables `(database)`.
pub fn merge_source_labels(mut fresh: Vec<TableInfo>, previous: &[TableInfo]) -> Vec<TableInfo> {
    let prior: HashMap<&str, &str> = previous
        .iter()
        .filter(|t| !is_sentinel_label(&t.source_file))
        .map(|t| (t.name.as_str(), t.source_file.as_str()))
        .collect();

    for table in &mut fresh {
        table.source_file = match prior.get(table.name.as_str()) {
            Some(label) => label.to_string(),
            None if table.is_view => VIEWS_LABEL.to_string(),
            None => DATABASE_LABEL.to_string(),
        };
    }
    fresh
}

/// Introspect the catalog and label it against the previous snapshot.
pub fn refresh(engine: &dyn Engine, previous: &[TableInfo]) -> Result<Vec<TableInfo>> {
    Ok(merge_source_labels(list_relations(engine)?, previous))
}
