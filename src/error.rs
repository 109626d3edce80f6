//! Quarry error types.
//!
//! All errors are typed and provide root cause information.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Quarry operations.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// I/O error during file operations.
    #[error("I/O error for path {path}: {source}")]
    Io {
        /// The file path that caused the I/O error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The engine rejected a statement or could not be reached.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Processing one ingestion group failed.
    #[error("Error processing {group}: {source}")]
    Group {
        /// Name of the group that failed.
        group: String,
        /// The underlying failure.
        #[source]
        source: Box<QuarryError>,
    },

    /// A virtual file path is not usable for registration.
    #[error("Invalid virtual path: {0}")]
    InvalidPath(String),

    /// Project does not exist in the store.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// View does not exist in the catalog or the store.
    #[error("View not found: {0}")]
    ViewNotFound(String),

    /// A store manifest could not be read or written.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl QuarryError {
    /// Wrap an error with the name of the ingestion group it came from.
    pub fn in_group(group: &str, source: QuarryError) -> Self {
        QuarryError::Group {
            group: group.to_string(),
            source: Box::new(source),
        }
    }

    /// Stable identifier used in CLI error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            QuarryError::Io { .. } => "Io",
            QuarryError::Engine(_) => "Engine",
            QuarryError::Group { .. } => "Group",
            QuarryError::InvalidPath(_) => "InvalidPath",
            QuarryError::ProjectNotFound(_) => "ProjectNotFound",
            QuarryError::ViewNotFound(_) => "ViewNotFound",
            QuarryError::Manifest(_) => "Manifest",
            QuarryError::Json(_) => "Json",
            QuarryError::Other(_) => "Other",
        }
    }

    /// Optional remediation hint.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            QuarryError::Group { .. } => {
                Some("Groups ingested before the failing one are still registered")
            }
            QuarryError::ProjectNotFound(_) => Some("Run `quarry project list` to see known projects"),
            QuarryError::InvalidPath(_) => Some("Relative paths may not be absolute or contain '..'"),
            QuarryError::Manifest(_) => Some("The project directory may have been edited by hand"),
            _ => None,
        }
    }

    /// File path context, when the error carries one.
    pub fn file_path(&self) -> Option<&std::path::Path> {
        match self {
            QuarryError::Io { path, .. } => Some(path.as_path()),
            QuarryError::Group { source, .. } => source.file_path(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for QuarryError {
    fn from(err: std::io::Error) -> Self {
        QuarryError::Io {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

#[cfg(feature = "duckdb")]
impl From<duckdb::Error> for QuarryError {
    fn from(err: duckdb::Error) -> Self {
        QuarryError::Engine(err.to_string())
    }
}

/// Result type alias for Quarry operations.
pub type Result<T> = std::result::Result<T, QuarryError>;
