//! Per-node execution state and the run it belongs to

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Execution status of a single node within a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Success,
    Error,
    Skipped,
}

impl NodeStatus {
    /// Terminal statuses never change again within a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Error | NodeStatus::Skipped)
    }

    /// Whether a node in this status may move to `next`
    ///
    /// Status only moves forward: `pending -> running -> terminal`. The one
    /// shortcut is `pending -> skipped`, for nodes that never ran.
    pub fn can_transition_to(&self, next: NodeStatus) -> bool {
        match self {
            NodeStatus::Pending => matches!(
                next,
                NodeStatus::Pending | NodeStatus::Running | NodeStatus::Skipped
            ),
            NodeStatus::Running => next != NodeStatus::Pending,
            NodeStatus::Success | NodeStatus::Error | NodeStatus::Skipped => false,
        }
    }
}

/// Observable state of one node in the current run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionNodeState {
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionNodeState {
    /// Merge a patch, honoring monotonic status
    ///
    /// Returns false (and leaves the state untouched) if the node is already
    /// terminal or the patch would move its status backwards.
    pub fn apply(&mut self, patch: NodeStatePatch) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if let Some(next) = patch.status {
            if !self.status.can_transition_to(next) {
                return false;
            }
            self.status = next;
        }
        if patch.started_at.is_some() {
            self.started_at = patch.started_at;
        }
        if patch.completed_at.is_some() {
            self.completed_at = patch.completed_at;
        }
        if patch.input.is_some() {
            self.input = patch.input;
        }
        if patch.output.is_some() {
            self.output = patch.output;
        }
        if patch.error.is_some() {
            self.error = patch.error;
        }
        true
    }
}

/// A partial update to an [`ExecutionNodeState`]; `None` fields are left as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStatePatch {
    pub status: Option<NodeStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl NodeStatePatch {
    pub fn running(at: DateTime<Utc>, input: serde_json::Value) -> Self {
        Self {
            status: Some(NodeStatus::Running),
            started_at: Some(at),
            input: Some(input),
            ..Self::default()
        }
    }

    pub fn succeeded(at: DateTime<Utc>, output: serde_json::Value) -> Self {
        Self {
            status: Some(NodeStatus::Success),
            completed_at: Some(at),
            output: Some(output),
            ..Self::default()
        }
    }

    pub fn failed(at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            status: Some(NodeStatus::Error),
            completed_at: Some(at),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn skipped(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(NodeStatus::Skipped),
            completed_at: Some(at),
            ..Self::default()
        }
    }
}

/// Identifies one particular start of a run
///
/// Returned by [`ExecutionTracker::start_run`]. Two starts under the same
/// run id get different tokens, so writes from the first cannot land on the
/// second.
///
/// [`ExecutionTracker::start_run`]: super::ExecutionTracker::start_run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunToken {
    run_id: String,
    generation: u64,
}

impl RunToken {
    pub(crate) fn new(run_id: String, generation: u64) -> Self {
        Self { run_id, generation }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The live state of one run
///
/// The key set of `node_states` is fixed when the run starts. A cleared run
/// has no id, no node states and is not running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRun {
    pub run_id: Option<String>,
    /// Bumped on every start and clear
    pub generation: u64,
    pub node_states: HashMap<NodeId, ExecutionNodeState>,
    /// Node ids in the order the run was started with
    pub order: Vec<NodeId>,
    pub is_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl ExecutionRun {
    /// A fresh run with every node pending
    pub fn start(run_id: impl Into<String>, node_ids: Vec<NodeId>, started_at: DateTime<Utc>) -> Self {
        let mut order = Vec::with_capacity(node_ids.len());
        let mut node_states = HashMap::with_capacity(node_ids.len());
        for id in node_ids {
            if node_states.insert(id.clone(), ExecutionNodeState::default()).is_none() {
                order.push(id);
            }
        }
        Self {
            run_id: Some(run_id.into()),
            node_states,
            order,
            is_running: true,
            started_at: Some(started_at),
            generation: 0,
        }
    }

    /// Whether this run was started under `run_id`, regardless of generation
    pub fn has_id(&self, run_id: &str) -> bool {
        self.run_id.as_deref() == Some(run_id)
    }

    /// Whether `token` refers to this exact start of the run
    pub fn is_current(&self, token: &RunToken) -> bool {
        self.generation == token.generation && self.has_id(&token.run_id)
    }

    pub fn status_of(&self, node_id: &str) -> Option<NodeStatus> {
        self.node_states.get(node_id).map(|s| s.status)
    }

    /// Node states in run order
    pub fn ordered_states(&self) -> impl Iterator<Item = (&NodeId, &ExecutionNodeState)> {
        self.order
            .iter()
            .filter_map(|id| self.node_states.get(id).map(|state| (id, state)))
    }

    /// Count of nodes per status
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for state in self.node_states.values() {
            match state.status {
                NodeStatus::Pending => summary.pending += 1,
                NodeStatus::Running => summary.running += 1,
                NodeStatus::Success => summary.succeeded += 1,
                NodeStatus::Error => summary.failed += 1,
                NodeStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

/// Status counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}
