//! Live execution status of the current run
//!
//! The tracker is a cheap, cloneable handle around shared run state. The
//! editing surface reads snapshots from it; the run driver is its only
//! writer. Starting a run replaces whatever run was current: there is no
//! queueing.
//!
//! Every start and clear bumps a generation counter. `start_run` hands back a
//! [`RunToken`] for that exact start, and writes from the driver carry it
//! ([`ExecutionTracker::update_node_state_for_run`]). A write whose token is
//! no longer current is dropped, so work still in flight for a cleared or
//! superseded run cannot touch its replacement, even one restarted under the
//! same run id.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::clock::{Clock, SystemClock};
use super::state::{ExecutionNodeState, ExecutionRun, NodeStatePatch, NodeStatus, RunToken};
use crate::types::NodeId;

/// Shared handle to the current run's state
#[derive(Clone)]
pub struct ExecutionTracker {
    run: Arc<RwLock<ExecutionRun>>,
    clock: Arc<dyn Clock>,
}

impl ExecutionTracker {
    /// Create a tracker with no run, using the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            run: Arc::new(RwLock::new(ExecutionRun::default())),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ---- read access -------------------------------------------------------

    /// Copy of the whole run state
    pub fn snapshot(&self) -> ExecutionRun {
        self.run.read().clone()
    }

    pub fn run_id(&self) -> Option<String> {
        self.run.read().run_id.clone()
    }

    pub fn is_running(&self) -> bool {
        self.run.read().is_running
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.run.read().started_at
    }

    pub fn node_state(&self, node_id: &str) -> Option<ExecutionNodeState> {
        self.run.read().node_states.get(node_id).cloned()
    }

    pub fn status_of(&self, node_id: &str) -> Option<NodeStatus> {
        self.run.read().status_of(node_id)
    }

    /// Whether `token` still refers to the run currently tracked
    pub fn is_current(&self, token: &RunToken) -> bool {
        self.run.read().is_current(token)
    }

    // ---- mutations ---------------------------------------------------------

    /// Begin tracking a run over exactly `node_ids`, all pending
    ///
    /// Replaces any prior run unconditionally, including one with the same
    /// id. The returned token identifies this start.
    pub fn start_run<I, S>(&self, run_id: impl Into<String>, node_ids: I) -> RunToken
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        let run_id = run_id.into();
        let ids: Vec<NodeId> = node_ids.into_iter().map(Into::into).collect();
        let mut run = self.run.write();
        if let Some(previous) = run.run_id.as_deref() {
            if run.is_running {
                log::info!("Run '{}' superseded by '{}'", previous, run_id);
            }
        }
        let generation = run.generation + 1;
        log::info!("Starting run '{}' over {} node(s)", run_id, ids.len());
        *run = ExecutionRun::start(run_id.clone(), ids, self.clock.now());
        run.generation = generation;
        RunToken::new(run_id, generation)
    }

    /// Merge `patch` into a node's state in whatever run is current
    ///
    /// Ignored if the node is not part of the run, or if the patch would
    /// break monotonic status. Returns whether it was applied.
    pub fn update_node_state(&self, node_id: &str, patch: NodeStatePatch) -> bool {
        let mut run = self.run.write();
        Self::apply_locked(&mut run, node_id, patch)
    }

    /// Like [`ExecutionTracker::update_node_state`], but only if `token`
    /// is still the current run
    pub fn update_node_state_for_run(&self, token: &RunToken, node_id: &str, patch: NodeStatePatch) -> bool {
        let mut run = self.run.write();
        if !run.is_current(token) {
            log::warn!(
                "Dropping update for node '{}' from stale run '{}' (generation {})",
                node_id,
                token.run_id(),
                token.generation()
            );
            return false;
        }
        Self::apply_locked(&mut run, node_id, patch)
    }

    /// Mark every still-pending node of the run as skipped
    ///
    /// Returns the skipped ids in run order; empty if `token` is not current.
    pub fn skip_pending(&self, token: &RunToken) -> Vec<NodeId> {
        let now = self.clock.now();
        let mut run = self.run.write();
        if !run.is_current(token) {
            return Vec::new();
        }

        let pending: Vec<NodeId> = run
            .ordered_states()
            .filter(|(_, state)| state.status == NodeStatus::Pending)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &pending {
            if let Some(state) = run.node_states.get_mut(id) {
                state.apply(NodeStatePatch::skipped(now));
            }
        }
        if !pending.is_empty() {
            log::debug!("Run '{}': skipped {} pending node(s)", token.run_id(), pending.len());
        }
        pending
    }

    /// Mark the run as no longer running; returns false if `token` is not current
    pub fn finish_run(&self, token: &RunToken) -> bool {
        let mut run = self.run.write();
        if !run.is_current(token) {
            return false;
        }
        run.is_running = false;
        let summary = run.summary();
        log::info!(
            "Run '{}' finished: {} succeeded, {} failed, {} skipped",
            token.run_id(),
            summary.succeeded,
            summary.failed,
            summary.skipped
        );
        true
    }

    /// Discard the current run entirely
    pub fn clear_run(&self) {
        let mut run = self.run.write();
        if let Some(id) = run.run_id.as_deref() {
            log::debug!("Clearing run '{}'", id);
        }
        *run = ExecutionRun {
            generation: run.generation + 1,
            ..ExecutionRun::default()
        };
    }

    fn apply_locked(run: &mut ExecutionRun, node_id: &str, patch: NodeStatePatch) -> bool {
        let Some(state) = run.node_states.get_mut(node_id) else {
            return false;
        };
        let from = state.status;
        let applied = state.apply(patch);
        if applied {
            log::debug!("Node '{}': {:?} -> {:?}", node_id, from, state.status);
        } else {
            log::warn!("Rejected state change for node '{}' in status {:?}", node_id, from);
        }
        applied
    }
}

impl Default for ExecutionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExecutionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionTracker")
            .field("run", &*self.run.read())
            .finish()
    }
}
