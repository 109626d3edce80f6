//! Quarry CLI binary
//!
//! Thin adapter over the library: every command opens the configured
//! project, delegates to a workspace and prints one JSON payload.

use quarry::cli::{CliErrorPayload, CliSuccessPayload, Commands, ProjectCommand, ViewCommand};
use quarry::config::Settings;
use quarry::engine::duckdb_engine::DuckDbEngine;
use quarry::ingest::{collect_inputs, IngestContext};
use quarry::workspace::Workspace;
use quarry::QuarryError;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

fn main() -> ExitCode {
    let cli = quarry::cli::parse_args();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("quarry=debug"))
            .init();
    }

    let settings = Settings::from_cli(&cli);
    let result = match cli.command {
        Commands::Ingest { paths, timeout } => execute_ingest(&settings, &paths, timeout),
        Commands::Query { sql } => execute_query(&settings, &sql),
        Commands::Catalog => execute_catalog(&settings),
        Commands::Graph => execute_graph(&settings),
        Commands::History => execute_history(&settings),
        Commands::View { command } => execute_view(&settings, command),
        Commands::Project { command } => execute_project(&settings, command),
    };

    match result {
        Ok(payload) => {
            print_json(&payload);
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_json(&CliErrorPayload::from_error(&e));
            ExitCode::from(1)
        }
    }
}

fn print_json<T: serde::Serialize>(payload: &T) {
    match serde_json::to_string_pretty(payload) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: failed to serialize output: {}", e),
    }
}

type CommandResult = Result<CliSuccessPayload, QuarryError>;

/// Open the configured project with stored files and views loaded.
fn open_workspace(settings: &Settings) -> Result<Workspace<DuckDbEngine>, QuarryError> {
    let mut workspace = Workspace::new(
        settings.open_engine()?,
        settings.open_store()?,
        &settings.project,
    )?;
    workspace.rehydrate(&mut IngestContext::new())?;
    Ok(workspace)
}

fn execute_ingest(settings: &Settings, paths: &[PathBuf], timeout: Option<u64>) -> CommandResult {
    let files = collect_inputs(paths)?;
    let mut workspace = open_workspace(settings)?;

    let deadline = timeout.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut ctx = IngestContext::new()
        .on_begin(|begin| {
            eprintln!(
                "Ingesting {} files in {} groups",
                begin.total_files, begin.total_groups
            )
        })
        .on_progress(|p| {
            eprintln!(
                "[{}/{}] {}: {}/{} files",
                p.group_index, p.total_groups, p.group_name, p.processed_files, p.total_files
            )
        })
        .abort_when(move || deadline.is_some_and(|d| Instant::now() >= d));

    let outcome = workspace.import(files, &mut ctx)?;
    let names: Vec<&str> = outcome.tables.iter().map(|t| t.name.as_str()).collect();
    let message = if outcome.aborted {
        format!("Ingestion stopped early: {} relations created", names.len())
    } else {
        format!("Ingested {} relations", names.len())
    };
    Ok(CliSuccessPayload::with_data(
        message,
        json!({ "relations": names, "aborted": outcome.aborted }),
    ))
}

fn execute_query(settings: &Settings, sql: &str) -> CommandResult {
    let mut workspace = open_workspace(settings)?;
    let result = workspace.run_query(sql)?;
    if let Some(error) = result.error {
        return Err(QuarryError::Engine(error));
    }
    let message = format!("{} rows in {:.1} ms", result.rows.len(), result.time_ms);
    Ok(CliSuccessPayload::with_data(message, serde_json::to_value(&result)?))
}

fn execute_catalog(settings: &Settings) -> CommandResult {
    let workspace = open_workspace(settings)?;
    let tables = workspace.tables();
    Ok(CliSuccessPayload::with_data(
        format!("{} relations", tables.len()),
        serde_json::to_value(tables)?,
    ))
}

fn execute_graph(settings: &Settings) -> CommandResult {
    let workspace = open_workspace(settings)?;
    let graph = workspace.graph();
    Ok(CliSuccessPayload::with_data(
        format!("{} nodes, {} links", graph.nodes.len(), graph.links.len()),
        serde_json::to_value(&graph)?,
    ))
}

fn execute_history(settings: &Settings) -> CommandResult {
    let store = settings.open_store()?;
    store.ensure_project(&settings.project)?;
    let history = store.get_history(&settings.project)?;
    Ok(CliSuccessPayload::with_data(
        format!("{} queries", history.len()),
        json!(history),
    ))
}

fn execute_view(settings: &Settings, command: ViewCommand) -> CommandResult {
    match command {
        ViewCommand::Create { name, sql } => {
            let mut workspace = open_workspace(settings)?;
            let name = workspace.save_view(&name, &sql)?;
            Ok(CliSuccessPayload::with_data(
                format!("Saved view '{}'", name),
                json!({ "name": name }),
            ))
        }
        ViewCommand::Drop { name } => {
            let mut workspace = open_workspace(settings)?;
            workspace.drop_view(&name)?;
            Ok(CliSuccessPayload::message_only(format!("Dropped view '{}'", name)))
        }
        ViewCommand::List => {
            let store = settings.open_store()?;
            store.ensure_project(&settings.project)?;
            let views = store.get_views(&settings.project)?;
            Ok(CliSuccessPayload::with_data(
                format!("{} views", views.len()),
                serde_json::to_value(&views)?,
            ))
        }
    }
}

fn execute_project(settings: &Settings, command: ProjectCommand) -> CommandResult {
    let store = settings.open_store()?;
    match command {
        ProjectCommand::New { name } => {
            let meta = store.create_project(&name)?;
            Ok(CliSuccessPayload::with_data(
                format!("Created project '{}'", meta.name),
                serde_json::to_value(&meta)?,
            ))
        }
        ProjectCommand::List => {
            let projects = store.list_projects()?;
            Ok(CliSuccessPayload::with_data(
                format!("{} projects", projects.len()),
                serde_json::to_value(&projects)?,
            ))
        }
    }
}
