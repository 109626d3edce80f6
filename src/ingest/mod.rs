//! Dropped files → engine relations ingestion pipeline.
//!
//! Files are grouped, each group's bytes are registered with the engine
//! one file at a time, and a load strategy picked from the group's shape
//! turns the registered bytes into tables or views. Groups run strictly in
//! sequence over a single connection held for the whole call.

pub mod collect;
pub mod detect;
pub mod dispatch;
pub mod group;
pub mod progress;

use crate::engine::{Connection, Engine};
use crate::error::{QuarryError, Result};
use crate::table::TableInfo;
use log::{debug, info};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

pub use collect::collect_inputs;
pub use group::{group_files, FileGroup, GroupKind};
pub use progress::{IngestBegin, IngestContext, IngestProgress, ProgressState};

/// Where an input file's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FileSource {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// A dropped file: a name, an optional folder-relative path, and bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    relative_path: Option<String>,
    source: FileSource,
}

impl InputFile {
    /// A file whose bytes are already in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            relative_path: None,
            source: FileSource::Memory(bytes),
        }
    }

    /// A file read lazily from disk, named after its final path component.
    pub fn from_disk(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            relative_path: None,
            source: FileSource::Disk(path.to_path_buf()),
        }
    }

    /// Mark this file as part of a dropped folder.
    ///
    /// The path uses `/` separators and starts with the folder name.
    pub fn with_relative_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = Some(relative_path.into());
        self
    }

    /// File name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Folder-relative path, if the file came from a folder.
    pub fn relative_path(&self) -> Option<&str> {
        self.relative_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Path the bytes are registered under.
    pub fn virtual_path(&self) -> &str {
        self.relative_path().unwrap_or(&self.name)
    }

    /// Read the file's bytes.
    pub fn read_bytes(&self) -> Result<Cow<'_, [u8]>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(Cow::Borrowed(bytes)),
            FileSource::Disk(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|e| QuarryError::Io {
                    path: path.clone(),
                    source: e,
                }),
        }
    }
}

/// What one ingestion call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    /// Relations created, in group order.
    pub tables: Vec<TableInfo>,
    /// Whether the caller's abort predicate stopped the call early.
    pub aborted: bool,
}

enum GroupOutcome {
    Loaded(Vec<TableInfo>),
    Aborted,
}

/// Ingest dropped files into the engine.
///
/// An empty input returns immediately without touching the engine or the
/// context. A failing group aborts the call with an error naming the group;
/// groups completed before it stay registered.
pub fn ingest_files(
    engine: &dyn Engine,
    files: Vec<InputFile>,
    ctx: &mut IngestContext<'_>,
) -> Result<IngestOutcome> {
    if files.is_empty() {
        return Ok(IngestOutcome::default());
    }

    let groups = group_files(files);
    let total_files = groups.iter().map(|g| g.members.len()).sum();
    let mut progress = ProgressState::new(groups.len(), total_files);
    ctx.begin(&progress.begin());

    let conn = engine.connect()?;
    let mut outcome = IngestOutcome::default();
    let mut names = dispatch::ClaimedNames::default();

    for (idx, group) in groups.iter().enumerate() {
        if ctx.is_aborted() {
            info!("ingestion aborted before group '{}'", group.name);
            outcome.aborted = true;
            break;
        }

        progress.start_group(idx + 1, &group.name);
        ctx.progress(&progress.snapshot());

        match ingest_group(conn.as_ref(), group, &mut progress, ctx, &mut names) {
            Ok(GroupOutcome::Loaded(mut tables)) => outcome.tables.append(&mut tables),
            Ok(GroupOutcome::Aborted) => {
                info!(
                    "ingestion aborted inside group '{}' after {} files",
                    group.name, progress.processed_files
                );
                outcome.aborted = true;
                break;
            }
            Err(e) => return Err(QuarryError::in_group(&group.name, e)),
        }
    }

    Ok(outcome)
}

fn ingest_group(
    conn: &dyn Connection,
    group: &FileGroup,
    progress: &mut ProgressState,
    ctx: &mut IngestContext<'_>,
    names: &mut dispatch::ClaimedNames,
) -> Result<GroupOutcome> {
    for member in &group.members {
        if ctx.is_aborted() {
            return Ok(GroupOutcome::Aborted);
        }
        let bytes = member.read_bytes()?;
        conn.register_bytes(member.virtual_path(), &bytes)?;
        progress.file_registered();
        ctx.progress(&progress.snapshot());
    }

    let strategy = detect::classify(group);
    debug!("group '{}' uses {:?}", group.name, strategy);
    dispatch::load_group(conn, group, strategy, names).map(GroupOutcome::Loaded)
}
