//! Command-line interface for Quarry.
//!
//! This module handles argument parsing and output payloads only.
//! Engine and store work happens in the library modules.

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Quarry: load data files into an embedded SQL engine and explore them.
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding stored projects.
    #[arg(long, env = "QUARRY_DATA_DIR", default_value = crate::config::DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Project to work on.
    #[arg(long, env = "QUARRY_PROJECT", default_value = crate::config::DEFAULT_PROJECT, global = true)]
    pub project: String,

    /// Persist engine state to this database file instead of memory.
    #[arg(long, env = "QUARRY_DATABASE", global = true)]
    pub database: Option<PathBuf>,
}

/// Available Quarry commands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Ingest files and folders into the current project.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Stop starting new work after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Run a SQL statement against the project's relations.
    Query {
        /// SQL text.
        sql: String,
    },

    /// List relations with their columns, sources and dependencies.
    Catalog,

    /// Print the lineage graph.
    Graph,

    /// Show recent queries, most recent first.
    History,

    /// Manage saved views.
    View {
        /// View operation.
        #[command(subcommand)]
        command: ViewCommand,
    },

    /// Manage projects.
    Project {
        /// Project operation.
        #[command(subcommand)]
        command: ProjectCommand,
    },
}

/// View subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum ViewCommand {
    /// Create or replace a view.
    Create {
        /// View name. Sanitized to an identifier.
        name: String,
        /// The view's SELECT statement.
        sql: String,
    },

    /// Drop a saved view.
    Drop {
        /// View name.
        name: String,
    },

    /// List saved view definitions.
    List,
}

/// Project subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project with a generated id.
    New {
        /// Display name.
        name: String,
    },

    /// List projects.
    List,
}

/// Parse command-line arguments.
///
/// Exits with a usage message on invalid input.
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// JSON success payload for CLI responses.
#[derive(Serialize)]
pub struct CliSuccessPayload {
    /// Status indicator ("ok").
    pub status: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CliSuccessPayload {
    /// Construct a payload containing only the message.
    pub fn message_only(message: String) -> Self {
        Self {
            status: "ok",
            message,
            data: None,
        }
    }

    /// Construct a payload with structured data.
    pub fn with_data(message: String, data: Value) -> Self {
        Self {
            status: "ok",
            message,
            data: Some(data),
        }
    }
}

/// JSON error payload for CLI responses.
#[derive(Serialize)]
pub struct CliErrorPayload {
    /// Status indicator ("error").
    pub status: &'static str,
    /// Structured error details.
    pub error: ErrorDetails,
}

/// Details for a CLI error payload.
#[derive(Serialize)]
pub struct ErrorDetails {
    /// Error kind identifier (Engine, Group, etc.).
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional file context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Optional hint for remediation steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliErrorPayload {
    /// Build payload from a QuarryError instance.
    pub fn from_error(error: &crate::QuarryError) -> Self {
        CliErrorPayload {
            status: "error",
            error: ErrorDetails {
                kind: error.kind(),
                message: error.to_string(),
                file: error
                    .file_path()
                    .map(|path| path.to_string_lossy().to_string()),
                hint: error.hint().map(str::to_string),
            },
        }
    }
}
