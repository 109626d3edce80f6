//! Local project persistence.
//!
//! Each project lives in `<root>/projects/<project_id>/` holding the raw
//! bytes of imported files under `files/`, a manifest tracking their
//! original names and hashes, the saved view definitions and the query
//! history.

use crate::error::{QuarryError, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Maximum number of history entries kept per project.
pub const HISTORY_LIMIT: usize = 50;

const PROJECT_FILE: &str = "project.json";
const MANIFEST_FILE: &str = "manifest.json";
const VIEWS_FILE: &str = "views.json";
const HISTORY_FILE: &str = "history.json";
const FILES_DIR: &str = "files";

/// Project metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    /// Project identifier, also its directory name.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Creation time (RFC 3339).
    pub created_at: String,
}

/// Manifest entry for one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Original file name.
    pub name: String,
    /// Folder-relative path, if the file came from a folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    /// SHA-256 hash of the content.
    pub hash: String,
    /// Byte count.
    pub size: u64,
    /// When the file was stored (RFC 3339).
    pub stored_at: String,
}

impl FileEntry {
    fn storage_path(&self) -> &str {
        self.relative_path.as_deref().unwrap_or(&self.name)
    }
}

/// A stored file with its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Original file name.
    pub name: String,
    /// Folder-relative path, if the file came from a folder.
    pub relative_path: Option<String>,
    /// File content.
    pub bytes: Vec<u8>,
}

/// A saved view definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDef {
    /// View name.
    pub name: String,
    /// The view's SELECT statement.
    pub sql: String,
}

/// File-backed store for all projects under one root.
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: &Path) -> Result<Self> {
        let projects = root.join("projects");
        fs::create_dir_all(&projects).map_err(|e| QuarryError::Io {
            path: projects.clone(),
            source: e,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn project_dir(&self, project_id: &str) -> Result<PathBuf> {
        if !is_safe_relative(project_id) || project_id.contains('/') {
            return Err(QuarryError::InvalidPath(project_id.to_string()));
        }
        Ok(self.root.join("projects").join(project_id))
    }

    fn existing_project_dir(&self, project_id: &str) -> Result<PathBuf> {
        let dir = self.project_dir(project_id)?;
        if !dir.join(PROJECT_FILE).exists() {
            return Err(QuarryError::ProjectNotFound(project_id.to_string()));
        }
        Ok(dir)
    }

    /// Create a project with a fresh UUID.
    pub fn create_project(&self, name: &str) -> Result<ProjectMeta> {
        let id = uuid::Uuid::new_v4().to_string();
        self.write_project(&id, name)
    }

    /// Make sure a project with this id exists, creating it if needed.
    pub fn ensure_project(&self, project_id: &str) -> Result<ProjectMeta> {
        let dir = self.project_dir(project_id)?;
        let meta_path = dir.join(PROJECT_FILE);
        if meta_path.exists() {
            return read_json(&meta_path);
        }
        self.write_project(project_id, project_id)
    }

    fn write_project(&self, id: &str, name: &str) -> Result<ProjectMeta> {
        let dir = self.project_dir(id)?;
        create_dir(&dir)?;
        let meta = ProjectMeta {
            id: id.to_string(),
            name: name.to_string(),
            created_at: now(),
        };
        write_json(&dir.join(PROJECT_FILE), &meta)?;
        Ok(meta)
    }

    /// All projects, ordered by creation time.
    pub fn list_projects(&self) -> Result<Vec<ProjectMeta>> {
        let projects = self.root.join("projects");
        let entries = fs::read_dir(&projects).map_err(|e| QuarryError::Io {
            path: projects.clone(),
            source: e,
        })?;

        let mut metas = Vec::new();
        for entry in entries {
            let entry = entry?;
            let meta_path = entry.path().join(PROJECT_FILE);
            if meta_path.exists() {
                metas.push(read_json::<ProjectMeta>(&meta_path)?);
            }
        }
        metas.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(metas)
    }

    /// Store a file's bytes. A file with the same path replaces the old one.
    pub fn put_file(
        &self,
        project_id: &str,
        name: &str,
        relative_path: Option<&str>,
        bytes: &[u8],
    ) -> Result<()> {
        let dir = self.existing_project_dir(project_id)?;
        let entry = FileEntry {
            name: name.to_string(),
            relative_path: relative_path.filter(|p| !p.is_empty()).map(str::to_string),
            hash: compute_hash(bytes),
            size: bytes.len() as u64,
            stored_at: now(),
        };
        let storage_path = entry.storage_path().to_string();
        if !is_safe_relative(&storage_path) {
            return Err(QuarryError::InvalidPath(storage_path));
        }

        let target = dir.join(FILES_DIR).join(&storage_path);
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }
        fs::write(&target, bytes).map_err(|e| QuarryError::Io {
            path: target.clone(),
            source: e,
        })?;

        let manifest_path = dir.join(MANIFEST_FILE);
        let mut manifest: Vec<FileEntry> = read_json_or_default(&manifest_path)?;
        match manifest.iter_mut().find(|e| e.storage_path() == storage_path) {
            Some(existing) => *existing = entry,
            None => manifest.push(entry),
        }
        write_json(&manifest_path, &manifest)
    }

    /// All stored files in the order they were first stored.
    ///
    /// Content is checked against the recorded hash.
    pub fn get_files(&self, project_id: &str) -> Result<Vec<StoredFile>> {
        let dir = self.existing_project_dir(project_id)?;
        let manifest: Vec<FileEntry> = read_json_or_default(&dir.join(MANIFEST_FILE))?;

        let mut files = Vec::with_capacity(manifest.len());
        for entry in manifest {
            let path = dir.join(FILES_DIR).join(entry.storage_path());
            let bytes = fs::read(&path).map_err(|e| QuarryError::Io {
                path: path.clone(),
                source: e,
            })?;

            let actual = compute_hash(&bytes);
            if actual != entry.hash {
                return Err(QuarryError::Manifest(format!(
                    "Hash mismatch for {}: expected {}, got {}",
                    entry.storage_path(),
                    entry.hash,
                    actual
                )));
            }

            files.push(StoredFile {
                name: entry.name,
                relative_path: entry.relative_path,
                bytes,
            });
        }
        Ok(files)
    }

    /// Save a view, replacing any view of the same name.
    pub fn put_view(&self, project_id: &str, view: ViewDef) -> Result<()> {
        let path = self.existing_project_dir(project_id)?.join(VIEWS_FILE);
        let mut views: Vec<ViewDef> = read_json_or_default(&path)?;
        match views.iter_mut().find(|v| v.name == view.name) {
            Some(existing) => existing.sql = view.sql,
            None => views.push(view),
        }
        write_json(&path, &views)
    }

    /// Remove a saved view. Unknown names are ignored.
    pub fn delete_view(&self, project_id: &str, name: &str) -> Result<()> {
        let path = self.existing_project_dir(project_id)?.join(VIEWS_FILE);
        let mut views: Vec<ViewDef> = read_json_or_default(&path)?;
        views.retain(|v| v.name != name);
        write_json(&path, &views)
    }

    /// Saved views in the order they were first saved.
    pub fn get_views(&self, project_id: &str) -> Result<Vec<ViewDef>> {
        read_json_or_default(&self.existing_project_dir(project_id)?.join(VIEWS_FILE))
    }

    /// Record a query at the front of the history.
    pub fn push_history(&self, project_id: &str, sql: &str) -> Result<()> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Ok(());
        }
        let path = self.existing_project_dir(project_id)?.join(HISTORY_FILE);
        let mut history: Vec<String> = read_json_or_default(&path)?;
        history.retain(|h| h != sql);
        history.insert(0, sql.to_string());
        history.truncate(HISTORY_LIMIT);
        write_json(&path, &history)
    }

    /// Query history, most recent first.
    pub fn get_history(&self, project_id: &str) -> Result<Vec<String>> {
        read_json_or_default(&self.existing_project_dir(project_id)?.join(HISTORY_FILE))
    }
}

fn is_safe_relative(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| QuarryError::Io {
        path: dir.to_path_buf(),
        source: e,
    })
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).map_err(|e| QuarryError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json)
        .map_err(|e| QuarryError::Manifest(format!("Failed to parse {}: {}", path.display(), e)))
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if path.exists() {
        read_json(path)
    } else {
        Ok(T::default())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| QuarryError::Manifest(format!("Failed to serialize {}: {}", path.display(), e)))?;
    fs::write(path, json).map_err(|e| QuarryError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Compute SHA-256 hash of bytes.
fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
