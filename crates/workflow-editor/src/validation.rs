//! Graph integrity checks
//!
//! The editing operations trust their callers: `connect` does not look up
//! its endpoints and a run accepts whatever id list it is handed. These
//! checks let a host find out whether a graph (or a run's id list) is
//! well-formed before saving or executing it.

use std::collections::HashSet;

use crate::catalog::{self, HandleDirection};
use crate::types::{GraphEdge, GraphNode};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Two nodes share an id
    DuplicateNodeId { node_id: String },
    /// Two edges share an id
    DuplicateEdgeId { edge_id: String },
    /// An edge references a non-existent node
    UnknownNode { edge_id: String, node_id: String },
    /// An edge names a handle the node's kind does not have
    UnknownHandle {
        edge_id: String,
        node_id: String,
        handle_id: String,
    },
    /// An edge leaves through an inbound handle or enters through an outbound one
    WrongHandleDirection {
        edge_id: String,
        node_id: String,
        handle_id: String,
    },
    /// An edge connects a node to itself
    SelfLoop { edge_id: String },
    /// A run was asked to track a node that is not in the graph
    UnknownRunNode { node_id: String },
    /// A run lists the same node twice
    DuplicateRunNode { node_id: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNodeId { node_id } => write!(f, "Duplicate node id '{}'", node_id),
            Self::DuplicateEdgeId { edge_id } => write!(f, "Duplicate edge id '{}'", edge_id),
            Self::UnknownNode { edge_id, node_id } => {
                write!(f, "Edge '{}' references unknown node '{}'", edge_id, node_id)
            }
            Self::UnknownHandle {
                edge_id,
                node_id,
                handle_id,
            } => write!(
                f,
                "Edge '{}' uses handle '{}' which node '{}' does not have",
                edge_id, handle_id, node_id
            ),
            Self::WrongHandleDirection {
                edge_id,
                node_id,
                handle_id,
            } => write!(
                f,
                "Edge '{}' uses handle '{}' on node '{}' in the wrong direction",
                edge_id, handle_id, node_id
            ),
            Self::SelfLoop { edge_id } => write!(f, "Edge '{}' connects a node to itself", edge_id),
            Self::UnknownRunNode { node_id } => {
                write!(f, "Run references unknown node '{}'", node_id)
            }
            Self::DuplicateRunNode { node_id } => {
                write!(f, "Run lists node '{}' more than once", node_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a node/edge set
///
/// Returns all validation errors found (not just the first).
pub fn validate_graph(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }

    let mut seen_edges = HashSet::new();
    for edge in edges {
        if !seen_edges.insert(edge.id.as_str()) {
            errors.push(ValidationError::DuplicateEdgeId {
                edge_id: edge.id.clone(),
            });
        }
        if edge.source_node_id == edge.target_node_id {
            errors.push(ValidationError::SelfLoop {
                edge_id: edge.id.clone(),
            });
        }
        check_endpoint(
            nodes,
            edge,
            &edge.source_node_id,
            edge.source_handle_id.as_deref(),
            HandleDirection::Outbound,
            &mut errors,
        );
        check_endpoint(
            nodes,
            edge,
            &edge.target_node_id,
            edge.target_handle_id.as_deref(),
            HandleDirection::Inbound,
            &mut errors,
        );
    }

    errors
}

/// Validate the id list handed to a run against the graph it came from
pub fn validate_run_nodes(nodes: &[GraphNode], run_ids: &[String]) -> Vec<ValidationError> {
    let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for id in run_ids {
        if !known.contains(id.as_str()) {
            errors.push(ValidationError::UnknownRunNode {
                node_id: id.clone(),
            });
        }
        if !seen.insert(id.as_str()) {
            errors.push(ValidationError::DuplicateRunNode {
                node_id: id.clone(),
            });
        }
    }
    errors
}

fn check_endpoint(
    nodes: &[GraphNode],
    edge: &GraphEdge,
    node_id: &str,
    handle_id: Option<&str>,
    expected: HandleDirection,
    errors: &mut Vec<ValidationError>,
) {
    let Some(node) = nodes.iter().find(|n| n.id == node_id) else {
        errors.push(ValidationError::UnknownNode {
            edge_id: edge.id.clone(),
            node_id: node_id.to_string(),
        });
        return;
    };

    let entry = catalog::entry(node.kind);
    match handle_id {
        Some(handle_id) => match entry.handle(handle_id) {
            None => errors.push(ValidationError::UnknownHandle {
                edge_id: edge.id.clone(),
                node_id: node_id.to_string(),
                handle_id: handle_id.to_string(),
            }),
            Some(handle) if handle.direction != expected => {
                errors.push(ValidationError::WrongHandleDirection {
                    edge_id: edge.id.clone(),
                    node_id: node_id.to_string(),
                    handle_id: handle_id.to_string(),
                })
            }
            Some(_) => {}
        },
        // Default handle: the kind must have at least one in this direction
        None => {
            if entry.handles_in(expected).next().is_none() {
                errors.push(ValidationError::WrongHandleDirection {
                    edge_id: edge.id.clone(),
                    node_id: node_id.to_string(),
                    handle_id: String::new(),
                });
            }
        }
    }
}
