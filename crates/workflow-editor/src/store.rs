//! Live graph state for one open workflow
//!
//! The store owns the node and edge collections, the selection pointer, a
//! dirty flag and the undo/redo [`History`]. It is an explicit value: hosts
//! construct one per editing session and hand it to whatever needs it.
//!
//! # Undo granularity
//!
//! Only structural mutations are recorded: adding a node, connecting or
//! removing an edge, and deleting selected nodes. Field edits
//! ([`GraphStore::update_node_data`]) and canvas interactions
//! ([`GraphStore::apply_node_changes`]) change the live state without a
//! history entry, since they happen at keystroke/drag frequency and would
//! otherwise flood the stack.

use std::collections::HashSet;

use uuid::Uuid;

use crate::catalog;
use crate::changes::{self, EdgeChange, NodeChange};
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::history::{GraphSnapshot, History};
use crate::types::{EdgeId, GraphEdge, GraphNode, NodeData, NodeId, NodeKind, Position, WorkflowDocument};
use crate::validation::{self, ValidationError};

/// Editable workflow graph with bounded undo/redo
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    workflow_id: Option<String>,
    workflow_name: Option<String>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    selected_node_id: Option<NodeId>,
    dirty: bool,
    history: History,
}

impl GraphStore {
    /// Create an empty, unbound store with the default history limit
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &EditorConfig) -> Self {
        Self {
            history: History::new(config.history_limit),
            ..Self::default()
        }
    }

    // ---- read access -------------------------------------------------------

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The node the configuration surface is focused on
    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    pub fn selected_node(&self) -> Option<&GraphNode> {
        self.selected_node_id().and_then(|id| self.find_node(id))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    pub fn workflow_name(&self) -> Option<&str> {
        self.workflow_name.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Copy of the current `{nodes, edges}`
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::new(self.nodes.clone(), self.edges.clone())
    }

    /// Node ids in the order a run should visit them (insertion order)
    pub fn run_order(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    // ---- structural mutations ----------------------------------------------

    /// Append a node
    ///
    /// The caller is responsible for `node.id` being unique.
    pub fn add_node(&mut self, node: GraphNode) {
        log::debug!("Adding node '{}' ({})", node.id, node.kind);
        self.record_structural_change();
        self.nodes.push(node);
    }

    /// Create a node of `kind` with catalog defaults and a fresh id
    pub fn add_node_of_kind(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = format!("{}-{}", kind, Uuid::new_v4());
        let data = catalog::entry(kind).default_data();
        self.add_node(GraphNode::new(id.clone(), kind, position, data));
        id
    }

    /// Connect two node handles with a new edge
    ///
    /// Endpoints are not checked against the node set (see
    /// [`GraphStore::validate`]). Connecting the same handles twice is a
    /// no-op and returns `None`.
    pub fn connect(
        &mut self,
        source_node_id: &str,
        source_handle_id: Option<&str>,
        target_node_id: &str,
        target_handle_id: Option<&str>,
    ) -> Option<EdgeId> {
        let edge = GraphEdge {
            id: format!("edge-{}", Uuid::new_v4()),
            source_node_id: source_node_id.to_string(),
            target_node_id: target_node_id.to_string(),
            source_handle_id: source_handle_id.map(str::to_string),
            target_handle_id: target_handle_id.map(str::to_string),
        };

        if self.edges.iter().any(|e| e.same_connection(&edge)) {
            log::debug!(
                "Ignoring duplicate connection {} -> {}",
                source_node_id,
                target_node_id
            );
            return None;
        }

        log::debug!("Connecting {} -> {} as '{}'", source_node_id, target_node_id, edge.id);
        self.record_structural_change();
        let id = edge.id.clone();
        self.edges.push(edge);
        Some(id)
    }

    /// Remove a single edge; returns false if no such edge exists
    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        let Some(index) = self.edges.iter().position(|e| e.id == edge_id) else {
            return false;
        };
        log::debug!("Removing edge '{}'", edge_id);
        self.record_structural_change();
        self.edges.remove(index);
        true
    }

    /// Delete every selected node and the edges touching them
    ///
    /// Returns the removed node ids. With nothing selected this does nothing
    /// at all: no history entry, dirty flag untouched.
    pub fn delete_selected_nodes(&mut self) -> Vec<NodeId> {
        let selected: HashSet<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id.clone())
            .collect();
        if selected.is_empty() {
            return Vec::new();
        }

        log::debug!("Deleting {} selected node(s)", selected.len());
        self.record_structural_change();

        let removed: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| selected.contains(&n.id))
            .map(|n| n.id.clone())
            .collect();
        self.nodes.retain(|n| !selected.contains(&n.id));
        self.edges
            .retain(|e| !selected.contains(&e.source_node_id) && !selected.contains(&e.target_node_id));
        self.selected_node_id = None;
        removed
    }

    // ---- non-recorded mutations --------------------------------------------

    /// Shallow-merge `partial` into a node's data
    ///
    /// Not undoable. Returns false if the node does not exist.
    pub fn update_node_data(&mut self, node_id: &str, partial: NodeData) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == node_id) else {
            return false;
        };
        for (key, value) in partial {
            node.data.insert(key, value);
        }
        self.dirty = true;
        true
    }

    /// Apply a batch of canvas node changes atomically
    ///
    /// Removing a node here also drops its edges. Moves and removals mark
    /// the store dirty; selection toggles alone do not. Not undoable.
    pub fn apply_node_changes(&mut self, node_changes: &[NodeChange]) {
        if node_changes.is_empty() {
            return;
        }

        let removed: HashSet<&NodeId> = changes::removed_node_ids(node_changes).collect();
        let next_nodes = changes::apply_node_changes(&self.nodes, node_changes);
        let next_edges: Vec<GraphEdge> = if removed.is_empty() {
            self.edges.clone()
        } else {
            self.edges
                .iter()
                .filter(|e| !removed.contains(&e.source_node_id) && !removed.contains(&e.target_node_id))
                .cloned()
                .collect()
        };

        if self
            .selected_node_id
            .as_ref()
            .is_some_and(|id| removed.contains(id))
        {
            self.selected_node_id = None;
        }
        if node_changes
            .iter()
            .any(|c| !matches!(c, NodeChange::Select { .. }))
        {
            self.dirty = true;
        }

        self.nodes = next_nodes;
        self.edges = next_edges;
    }

    /// Apply a batch of canvas edge changes atomically. Not undoable.
    pub fn apply_edge_changes(&mut self, edge_changes: &[EdgeChange]) {
        if edge_changes.is_empty() {
            return;
        }
        self.edges = changes::apply_edge_changes(&self.edges, edge_changes);
        self.dirty = true;
    }

    /// Point the configuration surface at a node (or at nothing)
    pub fn select_node(&mut self, node_id: Option<&str>) {
        self.selected_node_id = node_id.map(str::to_string);
    }

    // ---- history -------------------------------------------------------------

    /// Restore the state before the last structural change
    ///
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                log::debug!("Undo ({} step(s) left)", self.history.past_len());
                self.restore(&previous);
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone change
    ///
    /// Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                log::debug!("Redo ({} step(s) left)", self.history.future_len());
                self.restore(&next);
                true
            }
            None => false,
        }
    }

    // ---- whole-graph lifecycle -----------------------------------------------

    /// Replace the whole graph with a saved workflow
    ///
    /// History is discarded and the store starts clean.
    pub fn load_workflow(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
    ) {
        let id = id.into();
        log::debug!("Loading workflow '{}' ({} nodes, {} edges)", id, nodes.len(), edges.len());
        self.workflow_id = Some(id);
        self.workflow_name = Some(name.into());
        self.nodes = nodes;
        self.edges = edges;
        self.selected_node_id = None;
        self.history.clear();
        self.dirty = false;
    }

    pub fn load_document(&mut self, document: WorkflowDocument) {
        self.load_workflow(document.id, document.name, document.nodes, document.edges);
    }

    /// Reset to an empty graph that is not bound to any workflow
    pub fn clear_canvas(&mut self) {
        log::debug!("Clearing canvas");
        self.workflow_id = None;
        self.workflow_name = None;
        self.nodes.clear();
        self.edges.clear();
        self.selected_node_id = None;
        self.history.clear();
        self.dirty = false;
    }

    /// The current graph in its persisted shape
    pub fn to_document(&self) -> WorkflowDocument {
        WorkflowDocument {
            id: self.workflow_id.clone().unwrap_or_default(),
            name: self.workflow_name.clone().unwrap_or_default(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Record that the current state has been saved as `id`/`name`
    pub fn mark_saved(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.workflow_id = Some(id.into());
        self.workflow_name = Some(name.into());
        self.dirty = false;
    }

    // ---- integrity -----------------------------------------------------------

    /// All integrity problems in the current graph
    pub fn validate(&self) -> Vec<ValidationError> {
        validation::validate_graph(&self.nodes, &self.edges)
    }

    /// Like [`GraphStore::validate`], but as a `Result`
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EditorError::Validation(errors))
        }
    }

    fn record_structural_change(&mut self) {
        self.history.record(self.snapshot());
        self.dirty = true;
    }

    fn restore(&mut self, snapshot: &GraphSnapshot) {
        self.nodes = snapshot.nodes.clone();
        self.edges = snapshot.edges.clone();
        if let Some(id) = &self.selected_node_id {
            if !self.nodes.iter().any(|n| &n.id == id) {
                self.selected_node_id = None;
            }
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, kind: NodeKind, y: f64) -> GraphNode {
        GraphNode::new(id, kind, Position::new(0.0, y), catalog::entry(kind).default_data())
    }

    fn select(store: &mut GraphStore, id: &str) {
        store.apply_node_changes(&[NodeChange::Select {
            id: id.to_string(),
            selected: true,
        }]);
    }

    #[test]
    fn test_add_node_records_history() {
        let mut store = GraphStore::new();
        assert!(!store.is_dirty());

        store.add_node(node("a", NodeKind::Trigger, 0.0));
        assert_eq!(store.nodes().len(), 1);
        assert!(store.is_dirty());
        assert_eq!(store.history().past_len(), 1);
        assert!(store.history().oldest().unwrap().nodes.is_empty());
    }

    #[test]
    fn test_add_node_of_kind_uses_catalog_defaults() {
        let mut store = GraphStore::new();
        let id = store.add_node_of_kind(NodeKind::HttpRequest, Position::new(1.0, 2.0));
        assert!(id.starts_with("httpRequest-"));

        let node = store.find_node(&id).unwrap();
        assert_eq!(node.data["method"], "GET");
        assert_eq!(node.label(), "HTTP Request");
    }

    #[test]
    fn test_bounded_history() {
        let mut store = GraphStore::new();
        for i in 0..60 {
            store.add_node(node(&format!("n{}", i), NodeKind::Code, i as f64));
        }
        assert_eq!(store.history().past_len(), 50);
        // The ten oldest snapshots (0..=9 nodes) are gone
        assert_eq!(store.history().oldest().unwrap().nodes.len(), 10);

        while store.undo() {}
        assert_eq!(store.nodes().len(), 10);
    }

    #[test]
    fn test_history_limit_from_config() {
        let mut store = GraphStore::with_config(&EditorConfig { history_limit: 2 });
        for i in 0..4 {
            store.add_node(node(&format!("n{}", i), NodeKind::Code, 0.0));
        }
        assert_eq!(store.history().past_len(), 2);
    }

    #[test]
    fn test_update_node_data_is_not_undoable() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::AgentAction, 0.0));
        let past = store.history().past_len();

        let mut partial = NodeData::new();
        partial.insert("prompt".into(), json!("summarize"));
        assert!(store.update_node_data("a", partial));

        let data = &store.find_node("a").unwrap().data;
        assert_eq!(data["prompt"], "summarize");
        assert_eq!(data["label"], "Agent Action");
        assert_eq!(store.history().past_len(), past);

        assert!(!store.update_node_data("missing", NodeData::new()));
    }

    #[test]
    fn test_no_op_delete() {
        let mut store = GraphStore::new();
        store.load_workflow("wf", "Flow", vec![node("a", NodeKind::Trigger, 0.0)], vec![]);

        assert!(store.delete_selected_nodes().is_empty());
        assert_eq!(store.history().past_len(), 0);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_cascading_delete() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::Trigger, 0.0));
        store.add_node(node("x", NodeKind::Transform, 100.0));
        store.add_node(node("b", NodeKind::Output, 200.0));
        store.add_node(node("c", NodeKind::Output, 300.0));
        store.connect("a", Some("out"), "x", Some("in"));
        store.connect("x", Some("out"), "b", Some("in"));
        let keep = store.connect("a", Some("out"), "c", Some("in")).unwrap();

        select(&mut store, "x");
        store.select_node(Some("x"));
        assert_eq!(store.delete_selected_nodes(), vec!["x".to_string()]);

        assert!(store.edges().iter().all(|e| !e.touches("x")));
        assert_eq!(store.edges().len(), 1);
        assert_eq!(store.edges()[0].id, keep);
        assert!(store.selected_node_id().is_none());
    }

    #[test]
    fn test_connect_is_undoable_and_deduplicated() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::Trigger, 0.0));
        store.add_node(node("b", NodeKind::Output, 100.0));

        assert!(store.connect("a", Some("out"), "b", Some("in")).is_some());
        let past = store.history().past_len();
        assert!(store.connect("a", Some("out"), "b", Some("in")).is_none());
        assert_eq!(store.history().past_len(), past);
        assert_eq!(store.edges().len(), 1);

        assert!(store.undo());
        assert!(store.edges().is_empty());
        assert_eq!(store.nodes().len(), 2);
    }

    #[test]
    fn test_remove_edge() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::Trigger, 0.0));
        store.add_node(node("b", NodeKind::Output, 100.0));
        let edge = store.connect("a", None, "b", None).unwrap();

        assert!(store.remove_edge(&edge));
        assert!(store.edges().is_empty());
        assert!(!store.remove_edge(&edge));

        store.undo();
        assert_eq!(store.edges().len(), 1);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::Trigger, 0.0));
        store.add_node(node("b", NodeKind::Delay, 50.0));
        select(&mut store, "a");
        store.delete_selected_nodes();
        store.add_node(node("c", NodeKind::Output, 100.0));

        let nodes_before = store.nodes().to_vec();
        let edges_before = store.edges().to_vec();

        assert!(store.undo());
        assert_ne!(store.nodes(), nodes_before.as_slice());
        assert!(store.redo());
        assert_eq!(store.nodes(), nodes_before.as_slice());
        assert_eq!(store.edges(), edges_before.as_slice());
    }

    #[test]
    fn test_new_edit_discards_redo() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::Trigger, 0.0));
        store.add_node(node("b", NodeKind::Output, 100.0));
        store.undo();
        assert!(store.can_redo());

        store.add_node(node("c", NodeKind::Output, 100.0));
        assert!(!store.can_redo());
        assert!(!store.redo());
    }

    #[test]
    fn test_undo_redo_on_empty_history() {
        let mut store = GraphStore::new();
        assert!(!store.undo());
        assert!(!store.redo());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_undo_clears_dangling_selection() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::Trigger, 0.0));
        store.select_node(Some("a"));
        store.undo();
        assert!(store.selected_node_id().is_none());
    }

    #[test]
    fn test_canvas_changes_are_transient() {
        let mut store = GraphStore::new();
        store.load_workflow(
            "wf",
            "Flow",
            vec![node("a", NodeKind::Trigger, 0.0), node("b", NodeKind::Output, 100.0)],
            vec![],
        );
        store.connect("a", Some("out"), "b", Some("in"));
        let past = store.history().past_len();

        store.apply_node_changes(&[NodeChange::Position {
            id: "a".into(),
            position: Position::new(40.0, 40.0),
        }]);
        store.select_node(Some("b"));
        store.apply_node_changes(&[NodeChange::Remove { id: "b".into() }]);

        assert_eq!(store.history().past_len(), past);
        assert_eq!(store.find_node("a").unwrap().position, Position::new(40.0, 40.0));
        assert!(store.find_node("b").is_none());
        assert!(store.edges().is_empty());
        assert!(store.selected_node_id().is_none());
    }

    #[test]
    fn test_selection_toggle_does_not_dirty() {
        let mut store = GraphStore::new();
        store.load_workflow("wf", "Flow", vec![node("a", NodeKind::Trigger, 0.0)], vec![]);
        select(&mut store, "a");
        assert!(store.find_node("a").unwrap().selected);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_load_and_clear() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::Trigger, 0.0));

        store.load_workflow("wf-1", "Flow", vec![node("z", NodeKind::Code, 0.0)], vec![]);
        assert_eq!(store.workflow_id(), Some("wf-1"));
        assert_eq!(store.workflow_name(), Some("Flow"));
        assert!(!store.can_undo());
        assert!(!store.is_dirty());

        store.add_node(node("y", NodeKind::Code, 10.0));
        store.clear_canvas();
        assert!(store.workflow_id().is_none());
        assert!(store.nodes().is_empty());
        assert!(!store.can_undo());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_document_boundary() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::Trigger, 0.0));
        store.add_node(node("b", NodeKind::Output, 100.0));
        store.connect("a", Some("out"), "b", Some("in"));
        store.mark_saved("wf-9", "Saved");
        assert!(!store.is_dirty());

        let json = store.to_document().to_json().unwrap();
        let mut other = GraphStore::new();
        other.load_document(WorkflowDocument::from_json(&json).unwrap());
        assert_eq!(other.nodes(), store.nodes());
        assert_eq!(other.edges(), store.edges());
        assert_eq!(other.workflow_name(), Some("Saved"));
    }

    #[test]
    fn test_validate() {
        let mut store = GraphStore::new();
        store.add_node(node("a", NodeKind::Trigger, 0.0));
        store.connect("a", Some("out"), "ghost", Some("in"));

        assert_eq!(store.validate().len(), 1);
        match store.validate_strict() {
            Err(EditorError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_trigger_condition_output_scenario() {
        let mut store = GraphStore::new();
        let trigger = store.add_node_of_kind(NodeKind::Trigger, Position::new(0.0, 0.0));
        let condition = store.add_node_of_kind(NodeKind::Condition, Position::new(0.0, 100.0));
        let output = store.add_node_of_kind(NodeKind::Output, Position::new(0.0, 200.0));
        store.connect(&trigger, Some("out"), &condition, Some("in"));
        store.connect(&condition, Some("true"), &output, Some("in"));
        assert!(store.validate().is_empty());

        select(&mut store, &condition);
        let nodes_before = store.nodes().to_vec();
        let edges_before = store.edges().to_vec();

        store.delete_selected_nodes();
        assert!(store.find_node(&condition).is_none());
        assert!(store.find_node(&output).is_some());
        assert!(store.find_node(&trigger).is_some());
        assert!(store.edges().is_empty());

        assert!(store.undo());
        assert_eq!(store.nodes(), nodes_before.as_slice());
        assert_eq!(store.edges(), edges_before.as_slice());
    }

    #[test]
    fn test_run_order_is_insertion_order() {
        let mut store = GraphStore::new();
        store.add_node(node("b", NodeKind::Output, 100.0));
        store.add_node(node("a", NodeKind::Trigger, 0.0));
        assert_eq!(store.run_order(), vec!["b".to_string(), "a".to_string()]);
    }
}
