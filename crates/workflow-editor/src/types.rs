//! Core types for workflow graphs
//!
//! These types define the structure of an editable workflow: the closed set
//! of node kinds, node and edge instances, and the persisted document shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a handle on a node
pub type HandleId = String;

/// Free-form configuration payload of a node. Always carries a `label` key.
pub type NodeData = serde_json::Map<String, serde_json::Value>;

/// The kind of a workflow step
///
/// The set is closed: every catalog lookup and handle-topology match is
/// exhaustive over these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Trigger,
    AgentAction,
    Condition,
    Delay,
    Transform,
    Output,
    Loop,
    Parallel,
    HttpRequest,
    Code,
    ApprovalGate,
    SubWorkflow,
}

impl NodeKind {
    /// Every kind, in palette order
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Trigger,
        NodeKind::AgentAction,
        NodeKind::Condition,
        NodeKind::Delay,
        NodeKind::Transform,
        NodeKind::Output,
        NodeKind::Loop,
        NodeKind::Parallel,
        NodeKind::HttpRequest,
        NodeKind::Code,
        NodeKind::ApprovalGate,
        NodeKind::SubWorkflow,
    ];

    /// The wire name of this kind (e.g. `"agentAction"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::AgentAction => "agentAction",
            NodeKind::Condition => "condition",
            NodeKind::Delay => "delay",
            NodeKind::Transform => "transform",
            NodeKind::Output => "output",
            NodeKind::Loop => "loop",
            NodeKind::Parallel => "parallel",
            NodeKind::HttpRequest => "httpRequest",
            NodeKind::Code => "code",
            NodeKind::ApprovalGate => "approvalGate",
            NodeKind::SubWorkflow => "subWorkflow",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EditorError::UnknownNodeKind(s.to_string()))
    }
}

/// Canvas position of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique identifier, assigned once at creation
    pub id: NodeId,
    /// Kind of step; fixes the handle topology and never changes
    pub kind: NodeKind,
    /// Position on the canvas
    pub position: Position,
    /// Configuration payload
    pub data: NodeData,
    /// Whether the canvas currently has this node selected
    #[serde(default)]
    pub selected: bool,
}

impl GraphNode {
    /// Create an unselected node with the given data
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position, data: NodeData) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            data,
            selected: false,
        }
    }

    /// The node's display label, falling back to the kind name
    pub fn label(&self) -> &str {
        self.data
            .get("label")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| self.kind.as_str())
    }
}

/// An edge connecting two node handles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source_node_id: NodeId,
    /// Target node ID
    pub target_node_id: NodeId,
    /// Outbound handle on the source node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle_id: Option<HandleId>,
    /// Inbound handle on the target node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle_id: Option<HandleId>,
}

impl GraphEdge {
    /// Whether this edge starts or ends at `node_id`
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_node_id == node_id || self.target_node_id == node_id
    }

    /// Whether this edge joins the same endpoints and handles as `other`
    pub fn same_connection(&self, other: &GraphEdge) -> bool {
        self.source_node_id == other.source_node_id
            && self.target_node_id == other.target_node_id
            && self.source_handle_id == other.source_handle_id
            && self.target_handle_id == other.target_handle_id
    }
}

/// The persisted shape of a saved workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl WorkflowDocument {
    /// Create an empty document
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Serialize to the JSON boundary format
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from the JSON boundary format
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_wire_names() {
        for kind in NodeKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
        }
        assert_eq!(NodeKind::AgentAction.to_string(), "agentAction");
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let err = "madeUpKind".parse::<NodeKind>().unwrap_err();
        assert!(matches!(err, EditorError::UnknownNodeKind(ref k) if k == "madeUpKind"));
    }

    #[test]
    fn test_label_falls_back_to_kind() {
        let node = GraphNode::new("n1", NodeKind::Delay, Position::default(), NodeData::new());
        assert_eq!(node.label(), "delay");
    }

    #[test]
    fn test_document_json_shape() {
        let mut doc = WorkflowDocument::new("wf-1", "Demo");
        let mut data = NodeData::new();
        data.insert("label".into(), "Start".into());
        doc.nodes.push(GraphNode::new("n1", NodeKind::Trigger, Position::new(10.0, 20.0), data));
        doc.edges.push(GraphEdge {
            id: "e1".into(),
            source_node_id: "n1".into(),
            target_node_id: "n2".into(),
            source_handle_id: Some("out".into()),
            target_handle_id: None,
        });

        let json = doc.to_json().unwrap();
        assert!(json.contains("sourceNodeId"));
        assert!(json.contains("\"trigger\""));
        assert!(!json.contains("targetHandleId"));

        let parsed = WorkflowDocument::from_json(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_document_rejects_unknown_kind() {
        let json = r#"{"id":"w","name":"n","nodes":[{"id":"a","kind":"teleport","position":{"x":0,"y":0},"data":{}}]}"#;
        assert!(matches!(
            WorkflowDocument::from_json(json),
            Err(EditorError::Serialization(_))
        ));
    }
}
