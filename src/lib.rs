//! Quarry: drop-in file ingestion and catalog introspection for an embedded
//! analytical SQL engine.
//!
//! Dropped files are grouped by folder, loaded with a format-specific
//! strategy, and the resulting relations are introspected into a catalog
//! snapshot with view dependencies and a lineage graph.

#![warn(missing_docs)]
// env_logger is used by src/main.rs (binary), not this library
#![expect(unused_crate_dependencies)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod store;
pub mod table;
pub mod workspace;

/// Re-export common error types for convenience.
pub use error::{QuarryError, Result};

/// Re-export the relation snapshot type for convenience.
pub use table::TableInfo;

/// Quarry version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
