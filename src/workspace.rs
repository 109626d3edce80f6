//! One project's live session: engine state, stored state and the current
//! relation snapshot.

use crate::catalog;
use crate::engine::{quote_ident, run_query, Engine, QueryResult};
use crate::error::{QuarryError, Result};
use crate::graph::{build_graph, GraphData};
use crate::ingest::detect::sanitize;
use crate::ingest::{ingest_files, IngestContext, IngestOutcome, InputFile};
use crate::store::{ProjectStore, ViewDef};
use crate::table::TableInfo;
use log::{info, warn};

/// Engine and store bound to one project.
pub struct Workspace<E: Engine> {
    engine: E,
    store: ProjectStore,
    project_id: String,
    tables: Vec<TableInfo>,
}

impl<E: Engine> Workspace<E> {
    /// Bind an engine and a store to a project, creating it if needed.
    pub fn new(engine: E, store: ProjectStore, project_id: &str) -> Result<Self> {
        store.ensure_project(project_id)?;
        Ok(Self {
            engine,
            store,
            project_id: project_id.to_string(),
            tables: Vec::new(),
        })
    }

    /// The current relation snapshot.
    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    /// The underlying store.
    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    /// Ingest dropped files, persist them and refresh the snapshot.
    ///
    /// Files are persisted only when the call ran to completion.
    pub fn import(&mut self, files: Vec<InputFile>, ctx: &mut IngestContext<'_>) -> Result<IngestOutcome> {
        let outcome = self.ingest(files.clone(), ctx)?;
        if !outcome.aborted {
            for file in &files {
                self.store.put_file(
                    &self.project_id,
                    file.name(),
                    file.relative_path(),
                    &file.read_bytes()?,
                )?;
            }
        }
        Ok(outcome)
    }

    /// Reload stored files and views into the engine.
    pub fn rehydrate(&mut self, ctx: &mut IngestContext<'_>) -> Result<IngestOutcome> {
        let files = self
            .store
            .get_files(&self.project_id)?
            .into_iter()
            .map(|f| {
                let input = InputFile::from_bytes(f.name, f.bytes);
                match f.relative_path {
                    Some(path) => input.with_relative_path(path),
                    None => input,
                }
            })
            .collect();

        let outcome = self.ingest(files, ctx)?;
        if outcome.aborted {
            return Ok(outcome);
        }

        let views = self.store.get_views(&self.project_id)?;
        if !views.is_empty() {
            let conn = self.engine.connect()?;
            for view in &views {
                if let Err(e) = conn.execute(&create_view_sql(&view.name, &view.sql)) {
                    warn!("could not restore view '{}': {}", view.name, e);
                }
            }
        }

        self.refresh()?;
        info!(
            "rehydrated project '{}': {} relations",
            self.project_id,
            self.tables.len()
        );
        Ok(outcome)
    }

    fn ingest(&mut self, files: Vec<InputFile>, ctx: &mut IngestContext<'_>) -> Result<IngestOutcome> {
        let outcome = match ingest_files(&self.engine, files, ctx) {
            Ok(outcome) => outcome,
            Err(e) => {
                // Groups before the failing one stay in the engine.
                if let Err(refresh_err) = self.refresh() {
                    warn!("could not refresh after failed ingestion: {}", refresh_err);
                }
                return Err(e);
            }
        };

        // Ingestion labels take precedence over sentinels on refresh.
        let mut previous = self.tables.clone();
        previous.retain(|t| !outcome.tables.iter().any(|n| n.name == t.name));
        previous.extend(outcome.tables.iter().cloned());
        self.tables = catalog::refresh(&self.engine, &previous)?;
        Ok(outcome)
    }

    /// Re-read the catalog, keeping known source labels.
    pub fn refresh(&mut self) -> Result<&[TableInfo]> {
        self.tables = catalog::refresh(&self.engine, &self.tables)?;
        Ok(&self.tables)
    }

    /// Run user SQL and record it in the history.
    pub fn run_query(&mut self, sql: &str) -> Result<QueryResult> {
        let result = {
            let conn = self.engine.connect()?;
            run_query(conn.as_ref(), sql)
        };
        self.store.push_history(&self.project_id, sql)?;
        Ok(result)
    }

    /// Create or replace a view and persist its definition.
    ///
    /// Returns the sanitized view name.
    pub fn save_view(&mut self, name: &str, sql: &str) -> Result<String> {
        let name = sanitize(name);
        let sql = sql.trim().trim_end_matches(';').trim();
        {
            let conn = self.engine.connect()?;
            conn.execute(&create_view_sql(&name, sql))?;
        }
        self.store.put_view(
            &self.project_id,
            ViewDef {
                name: name.clone(),
                sql: sql.to_string(),
            },
        )?;
        self.refresh()?;
        Ok(name)
    }

    /// Drop a view from the engine and the store.
    pub fn drop_view(&mut self, name: &str) -> Result<()> {
        let known = self.tables.iter().any(|t| t.is_view && t.name == name)
            || self
                .store
                .get_views(&self.project_id)?
                .iter()
                .any(|v| v.name == name);
        if !known {
            return Err(QuarryError::ViewNotFound(name.to_string()));
        }

        {
            let conn = self.engine.connect()?;
            conn.execute(&format!("DROP VIEW IF EXISTS {}", quote_ident(name)))?;
        }
        self.store.delete_view(&self.project_id, name)?;
        self.refresh()?;
        Ok(())
    }

    /// Saved view definitions.
    pub fn views(&self) -> Result<Vec<ViewDef>> {
        self.store.get_views(&self.project_id)
    }

    /// Query history, most recent first.
    pub fn history(&self) -> Result<Vec<String>> {
        self.store.get_history(&self.project_id)
    }

    /// Lineage graph of the current snapshot.
    pub fn graph(&self) -> GraphData {
        build_graph(&self.tables)
    }
}

fn create_view_sql(name: &str, sql: &str) -> String {
    format!("CREATE OR REPLACE VIEW {} AS {}", quote_ident(name), sql)
}
