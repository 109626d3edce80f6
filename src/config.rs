//! Runtime settings resolved from CLI flags and environment.

use crate::error::Result;
use crate::store::ProjectStore;
use std::path::PathBuf;

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = ".quarry";

/// Default project id.
pub const DEFAULT_PROJECT: &str = "default";

/// Where Quarry keeps its state and which project it works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root of the project store.
    pub data_dir: PathBuf,
    /// Project id.
    pub project: String,
    /// On-disk engine database. In-memory when unset.
    pub database: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            project: DEFAULT_PROJECT.to_string(),
            database: None,
        }
    }
}

impl Settings {
    /// Settings from the parsed command line.
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone(),
            project: cli.project.clone(),
            database: cli.database.clone(),
        }
    }

    /// Open the project store under `data_dir`.
    pub fn open_store(&self) -> Result<ProjectStore> {
        ProjectStore::open(&self.data_dir)
    }

    /// Open the engine this configuration points at.
    #[cfg(feature = "duckdb")]
    pub fn open_engine(&self) -> Result<crate::engine::duckdb_engine::DuckDbEngine> {
        use crate::engine::duckdb_engine::DuckDbEngine;
        match &self.database {
            Some(path) => DuckDbEngine::open(path),
            None => DuckDbEngine::in_memory(),
        }
    }
}
