//! Workflow Editor - graph editing and run-status tracking
//!
//! This crate provides the state model behind a visual workflow editor:
//!
//! - A static catalog of the twelve node kinds with their handle topology
//! - An editable node/edge graph with selection, a dirty flag and bounded
//!   snapshot-based undo/redo
//! - A per-node execution status tracker driven one node at a time, with
//!   cascading skips after a failure
//!
//! # Architecture
//!
//! - `catalog`: read-only kind metadata, default data and category styles
//! - `GraphStore`: owns the live graph for one open workflow
//! - `ExecutionTracker`: owns the live status of the current run
//! - `RunDriver`: advances a run through a `StepExecutor`
//! - `EventSink`: generic event streaming for run progress
//!
//! # Example
//!
//! ```
//! use workflow_editor::{GraphStore, NodeKind, Position};
//!
//! let mut store = GraphStore::new();
//! let start = store.add_node_of_kind(NodeKind::Trigger, Position::new(0.0, 0.0));
//! let end = store.add_node_of_kind(NodeKind::Output, Position::new(0.0, 120.0));
//! store.connect(&start, Some("out"), &end, Some("in"));
//!
//! assert!(store.is_dirty());
//! store.undo();
//! assert!(store.edges().is_empty());
//! ```

pub mod builder;
pub mod catalog;
pub mod changes;
pub mod config;
pub mod error;
pub mod events;
pub mod execution;
pub mod history;
pub mod store;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::WorkflowBuilder;
pub use catalog::{CategoryStyle, HandleDef, HandleDirection, NodeCategory, RegistryEntry};
pub use changes::{EdgeChange, NodeChange};
pub use config::{EditorConfig, SimulationConfig};
pub use error::{EditorError, Result};
pub use events::{EventSink, ExecutionEvent, NullEventSink, VecEventSink};
pub use execution::{
    ExecutionNodeState, ExecutionRun, ExecutionTracker, NodeStatePatch, NodeStatus, RunDriver, RunOutcome, RunToken,
    SimulatedExecutor, StepExecutor, StepOutcome,
};
pub use history::{GraphSnapshot, History};
pub use store::GraphStore;
pub use types::{EdgeId, GraphEdge, GraphNode, NodeData, NodeId, NodeKind, Position, WorkflowDocument};
pub use validation::ValidationError;
