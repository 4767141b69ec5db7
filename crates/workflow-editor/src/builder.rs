//! Fluent builder for workflow documents
//!
//! # Example
//!
//! ```
//! use workflow_editor::{NodeKind, WorkflowBuilder};
//!
//! let doc = WorkflowBuilder::new("wf-1", "Review flow")
//!     .add_node("start", NodeKind::Trigger, (0.0, 0.0))
//!     .add_node("check", NodeKind::Condition, (0.0, 100.0))
//!     .with_data("field", "status")
//!     .add_node("done", NodeKind::Output, (0.0, 200.0))
//!     .add_edge("start", "out", "check", "in")
//!     .add_edge("check", "true", "done", "in")
//!     .build();
//!
//! assert_eq!(doc.nodes.len(), 3);
//! assert_eq!(doc.edges[1].source_handle_id.as_deref(), Some("true"));
//! ```

use crate::catalog;
use crate::error::{EditorError, Result};
use crate::types::{GraphEdge, GraphNode, NodeKind, Position, WorkflowDocument};
use crate::validation;

/// Fluent builder for workflow documents
pub struct WorkflowBuilder {
    id: String,
    name: String,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    edge_counter: usize,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_counter: 0,
        }
    }

    /// Add a node with the catalog's default data for its kind
    pub fn add_node(mut self, id: impl Into<String>, kind: NodeKind, position: (f64, f64)) -> Self {
        self.nodes.push(GraphNode::new(
            id,
            kind,
            Position::new(position.0, position.1),
            catalog::entry(kind).default_data(),
        ));
        self
    }

    /// Set one data field on the most recently added node
    ///
    /// Must be called immediately after `add_node`.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.data.insert(key.into(), value.into());
        }
        self
    }

    /// Add an edge between two handles (auto-generates edge ID)
    pub fn add_edge(
        mut self,
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        self.edge_counter += 1;
        self.edges.push(GraphEdge {
            id: format!("edge-{}", self.edge_counter),
            source_node_id: source.into(),
            target_node_id: target.into(),
            source_handle_id: Some(source_handle.into()),
            target_handle_id: Some(target_handle.into()),
        });
        self
    }

    /// Build the document without validation
    pub fn build(self) -> WorkflowDocument {
        WorkflowDocument {
            id: self.id,
            name: self.name,
            nodes: self.nodes,
            edges: self.edges,
        }
    }

    /// Build the document, rejecting it if it fails integrity checks
    pub fn build_validated(self) -> Result<WorkflowDocument> {
        let doc = self.build();
        let errors = validation::validate_graph(&doc.nodes, &doc.edges);
        if errors.is_empty() {
            Ok(doc)
        } else {
            Err(EditorError::Validation(errors))
        }
    }
}
