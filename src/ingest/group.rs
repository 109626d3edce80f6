//! Partitioning dropped files into ingestion groups.
//!
//! A file without a relative path is its own group. Files dropped as part
//! of a folder are bucketed by the first segment of their relative path;
//! deeper structure stays in each member's path.

use super::InputFile;
use std::collections::HashMap;

/// Shape of an ingestion group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// A single bare file.
    File,
    /// Every file beneath one top-level folder.
    Folder,
}

/// One logical ingestion unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FileGroup {
    /// Group shape.
    pub kind: GroupKind,
    /// File name, or the shared top-level folder name.
    pub name: String,
    /// Members in encounter order.
    pub members: Vec<InputFile>,
}

/// Partition input files into groups, preserving encounter order.
pub fn group_files(files: Vec<InputFile>) -> Vec<FileGroup> {
    let mut groups: Vec<FileGroup> = Vec::new();
    let mut folders: HashMap<String, usize> = HashMap::new();

    for file in files {
        match file.relative_path().and_then(first_segment) {
            Some(segment) => {
                let segment = segment.to_string();
                match folders.get(&segment) {
                    Some(&idx) => groups[idx].members.push(file),
                    None => {
                        folders.insert(segment.clone(), groups.len());
                        groups.push(FileGroup {
                            kind: GroupKind::Folder,
                            name: segment,
                            members: vec![file],
                        });
                    }
                }
            }
            None => groups.push(FileGroup {
                kind: GroupKind::File,
                name: file.name().to_string(),
                members: vec![file],
            }),
        }
    }

    groups
}

/// First non-empty `/`-separated segment of a relative path.
pub fn first_segment(path: &str) -> Option<&str> {
    path.split('/').find(|s| !s.is_empty())
}
