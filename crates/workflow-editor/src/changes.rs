//! Transient canvas changes
//!
//! Dragging, selection toggles and canvas-initiated removals arrive as small
//! change descriptions. They are applied as pure functions that produce new
//! node/edge vectors from the old ones plus a batch of changes.

use serde::{Deserialize, Serialize};

use crate::types::{EdgeId, GraphEdge, GraphNode, NodeId, Position};

/// A change to one node requested by the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    /// Node was dragged to a new position
    Position { id: NodeId, position: Position },
    /// Node selection toggled
    Select { id: NodeId, selected: bool },
    /// Canvas asked for the node to go away
    Remove { id: NodeId },
}

/// A change to one edge requested by the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Remove { id: EdgeId },
}

/// Apply a batch of node changes, returning the new node list
///
/// Changes naming nodes that do not exist are ignored. Removals are applied
/// after positional and selection updates, so a batch can move and remove the
/// same node without ordering surprises.
pub fn apply_node_changes(nodes: &[GraphNode], changes: &[NodeChange]) -> Vec<GraphNode> {
    let mut next: Vec<GraphNode> = nodes.to_vec();

    for change in changes {
        match change {
            NodeChange::Position { id, position } => {
                if let Some(node) = next.iter_mut().find(|n| &n.id == id) {
                    node.position = *position;
                }
            }
            NodeChange::Select { id, selected } => {
                if let Some(node) = next.iter_mut().find(|n| &n.id == id) {
                    node.selected = *selected;
                }
            }
            NodeChange::Remove { .. } => {}
        }
    }

    next.retain(|n| {
        !changes
            .iter()
            .any(|c| matches!(c, NodeChange::Remove { id } if id == &n.id))
    });
    next
}

/// Apply a batch of edge changes, returning the new edge list
pub fn apply_edge_changes(edges: &[GraphEdge], changes: &[EdgeChange]) -> Vec<GraphEdge> {
    edges
        .iter()
        .filter(|e| {
            !changes
                .iter()
                .any(|c| matches!(c, EdgeChange::Remove { id } if id == &e.id))
        })
        .cloned()
        .collect()
}

/// Ids of nodes removed by a batch
pub(crate) fn removed_node_ids(changes: &[NodeChange]) -> impl Iterator<Item = &NodeId> {
    changes.iter().filter_map(|c| match c {
        NodeChange::Remove { id } => Some(id),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeData, NodeKind};

    fn node(id: &str) -> GraphNode {
        GraphNode::new(id, NodeKind::Code, Position::default(), NodeData::new())
    }

    fn edge(id: &str, source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            id: id.to_string(),
            source_node_id: source.to_string(),
            target_node_id: target.to_string(),
            source_handle_id: None,
            target_handle_id: None,
        }
    }

    #[test]
    fn test_position_and_selection() {
        let nodes = vec![node("a"), node("b")];
        let changed = apply_node_changes(
            &nodes,
            &[
                NodeChange::Position {
                    id: "a".into(),
                    position: Position::new(5.0, 6.0),
                },
                NodeChange::Select {
                    id: "b".into(),
                    selected: true,
                },
            ],
        );

        assert_eq!(changed[0].position, Position::new(5.0, 6.0));
        assert!(changed[1].selected);
        // Input is untouched
        assert_eq!(nodes[0].position, Position::default());
        assert!(!nodes[1].selected);
    }

    #[test]
    fn test_remove_and_unknown_ids() {
        let nodes = vec![node("a"), node("b")];
        let changed = apply_node_changes(
            &nodes,
            &[
                NodeChange::Remove { id: "a".into() },
                NodeChange::Select {
                    id: "missing".into(),
                    selected: true,
                },
            ],
        );
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].id, "b");
    }

    #[test]
    fn test_edge_remove() {
        let edges = vec![edge("e1", "a", "b"), edge("e2", "b", "c")];
        let changed = apply_edge_changes(&edges, &[EdgeChange::Remove { id: "e1".into() }]);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].id, "e2");
    }

    #[test]
    fn test_change_wire_format() {
        let change: NodeChange =
            serde_json::from_str(r#"{"type":"select","id":"a","selected":true}"#).unwrap();
        assert_eq!(
            change,
            NodeChange::Select {
                id: "a".into(),
                selected: true
            }
        );
    }
}
