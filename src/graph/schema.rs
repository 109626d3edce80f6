//! Node groups and id conventions for the lineage graph.

use serde::Serialize;

/// Kind of graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeGroup {
    /// A source file or folder label.
    File,
    /// A base table.
    Table,
    /// A view.
    View,
}

/// Id prefix for file nodes, keeping them apart from relation names.
pub const FILE_ID_PREFIX: &str = "file:";

/// Node id for a source file label.
pub fn file_node_id(label: &str) -> String {
    format!("{}{}", FILE_ID_PREFIX, label)
}

/// Node id for a relation.
pub fn relation_node_id(name: &str) -> String {
    name.to_string()
}
