//! Lineage graph for the visualization layer.
//!
//! Files, tables and views become nodes; a file links to each table loaded
//! from it and a view links to each relation it reads. The graph is rebuilt
//! from scratch for every snapshot.

pub mod schema;

use crate::table::{is_sentinel_label, TableInfo};
use schema::{file_node_id, relation_node_id, NodeGroup};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// One graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Unique id within the graph.
    pub id: String,
    /// Node kind.
    pub group: NodeGroup,
    /// Display name.
    pub name: String,
}

/// One directed edge between node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
}

/// Nodes and links of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphData {
    /// All nodes.
    pub nodes: Vec<GraphNode>,
    /// All links. Every endpoint is a node id.
    pub links: Vec<GraphLink>,
}

impl GraphData {
    /// Whether a node with this id exists.
    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

/// Build the graph for a snapshot.
pub fn build_graph(tables: &[TableInfo]) -> GraphData {
    let mut graph = GraphData::default();

    let files: BTreeSet<&str> = tables
        .iter()
        .map(|t| t.source_file.as_str())
        .filter(|label| !is_sentinel_label(label))
        .collect();
    for label in &files {
        graph.nodes.push(GraphNode {
            id: file_node_id(label),
            group: NodeGroup::File,
            name: label.to_string(),
        });
    }

    let relations: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    for table in tables {
        graph.nodes.push(GraphNode {
            id: relation_node_id(&table.name),
            group: if table.is_view { NodeGroup::View } else { NodeGroup::Table },
            name: table.name.clone(),
        });
    }

    for table in tables {
        if table.is_view {
            let deps = table.dependencies.iter().flatten();
            for dep in deps.filter(|d| relations.contains(d.as_str())) {
                graph.links.push(GraphLink {
                    source: relation_node_id(&table.name),
                    target: relation_node_id(dep),
                });
            }
        } else if files.contains(table.source_file.as_str()) {
            graph.links.push(GraphLink {
                source: file_node_id(&table.source_file),
                target: relation_node_id(&table.name),
            });
        }
    }

    graph
}
