//! Turning filesystem paths into input files.
//!
//! A file path becomes a bare input; a directory is walked recursively and
//! each file beneath it gets a relative path rooted at the directory name,
//! the same shape a dropped folder has.

use super::InputFile;
use crate::error::{QuarryError, Result};
use glob::{glob, Pattern};
use std::path::Path;

/// Collect input files from files and directories on disk.
pub fn collect_inputs(paths: &[impl AsRef<Path>]) -> Result<Vec<InputFile>> {
    let mut inputs = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|e| QuarryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if meta.is_dir() {
            collect_dir(path, &mut inputs)?;
        } else {
            inputs.push(InputFile::from_disk(path));
        }
    }
    Ok(inputs)
}

fn collect_dir(dir: &Path, inputs: &mut Vec<InputFile>) -> Result<()> {
    let root_name = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .ok_or_else(|| QuarryError::InvalidPath(dir.display().to_string()))?;

    let pattern = format!("{}/**/*", Pattern::escape(&dir.to_string_lossy()));
    let entries = glob(&pattern).map_err(|e| QuarryError::Other(format!("Bad glob pattern: {}", e)))?;

    for entry in entries {
        let path = entry.map_err(|e| QuarryError::Io {
            path: e.path().to_path_buf(),
            source: std::io::Error::new(e.error().kind(), e.error().to_string()),
        })?;
        if !path.is_file() {
            continue;
        }
        let relative = path
            .strip_prefix(dir)
            .map_err(|_| QuarryError::InvalidPath(path.display().to_string()))?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let relative_path = format!("{}/{}", root_name, segments.join("/"));
        inputs.push(InputFile::from_disk(&path).with_relative_path(relative_path));
    }
    Ok(())
}
