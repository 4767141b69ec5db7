//! Run driver
//!
//! Advances node statuses for one run, one node at a time, in exactly the
//! order the caller supplies. The driver performs no dependency analysis of
//! the graph: callers decide the order (typically [`GraphStore::run_order`]).
//!
//! For each node the driver waits the configured step delay, marks the node
//! `running`, awaits the [`StepExecutor`], and records `success` or `error`.
//! The first error halts the run: after a short grace period every node
//! still pending is marked `skipped`. A run that reaches the end sweeps any
//! leftover pending nodes to `skipped` before finishing.
//!
//! A node id listed more than once runs once, at its first position. Events
//! are emitted only for status changes the tracker accepted, so the event
//! stream mirrors the tracker.
//!
//! Every await is a point where the run may have been cleared or replaced
//! through the tracker. The driver holds the [`RunToken`] of its own start,
//! checks it after each await and stops without touching the tracker once it
//! is no longer current.
//!
//! [`GraphStore::run_order`]: crate::store::GraphStore::run_order

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::task::JoinHandle;

use super::executor::{StepExecutor, StepOutcome};
use super::state::{NodeStatePatch, RunToken};
use super::tracker::ExecutionTracker;
use super::RunOutcome;
use crate::config::SimulationConfig;
use crate::events::{EventSink, ExecutionEvent, NullEventSink};
use crate::types::GraphNode;

/// Drives runs against a tracker using a step executor
pub struct RunDriver<E: StepExecutor> {
    tracker: ExecutionTracker,
    executor: E,
    config: SimulationConfig,
    event_sink: Arc<dyn EventSink>,
}

impl<E: StepExecutor> RunDriver<E> {
    /// Create a driver writing to `tracker`
    pub fn new(tracker: ExecutionTracker, executor: E, config: SimulationConfig) -> Self {
        Self {
            tracker,
            executor,
            config,
            event_sink: Arc::new(NullEventSink),
        }
    }

    /// Stream run events to `sink`
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn tracker(&self) -> &ExecutionTracker {
        &self.tracker
    }

    /// Drive a run over `nodes` to completion, failure or cancellation
    pub async fn drive_run(&self, run_id: &str, nodes: &[GraphNode]) -> RunOutcome {
        let mut seen = HashSet::new();
        let nodes: Vec<&GraphNode> = nodes.iter().filter(|&n| seen.insert(&n.id)).collect();

        let token = self
            .tracker
            .start_run(run_id, nodes.iter().map(|n| n.id.clone()));
        self.emit(ExecutionEvent::RunStarted {
            run_id: run_id.to_string(),
            node_count: nodes.len(),
        });

        let mut previous_output: Option<Value> = None;

        for node in nodes {
            tokio::time::sleep(self.config.step_delay()).await;
            if !self.tracker.is_current(&token) {
                return self.abandoned(run_id);
            }

            let input = synthesize_input(node, previous_output.as_ref());
            let started = self.tracker.update_node_state_for_run(
                &token,
                &node.id,
                NodeStatePatch::running(self.tracker.now(), input.clone()),
            );
            if !started {
                log::warn!("Run '{}': node '{}' could not start, passing over it", run_id, node.id);
                continue;
            }
            self.emit(ExecutionEvent::NodeStarted {
                run_id: run_id.to_string(),
                node_id: node.id.clone(),
            });

            let outcome = self.executor.execute(node, &input).await;
            if !self.tracker.is_current(&token) {
                return self.abandoned(run_id);
            }

            match outcome {
                StepOutcome::Success { output } => {
                    let recorded = self.tracker.update_node_state_for_run(
                        &token,
                        &node.id,
                        NodeStatePatch::succeeded(self.tracker.now(), output.clone()),
                    );
                    if recorded {
                        self.emit(ExecutionEvent::NodeSucceeded {
                            run_id: run_id.to_string(),
                            node_id: node.id.clone(),
                            output: output.clone(),
                        });
                    }
                    previous_output = Some(output);
                }
                StepOutcome::Failure { error } => {
                    let recorded = self.tracker.update_node_state_for_run(
                        &token,
                        &node.id,
                        NodeStatePatch::failed(self.tracker.now(), error.clone()),
                    );
                    if recorded {
                        self.emit(ExecutionEvent::NodeFailed {
                            run_id: run_id.to_string(),
                            node_id: node.id.clone(),
                            error: error.clone(),
                        });
                    }

                    tokio::time::sleep(self.config.skip_grace()).await;
                    if !self.tracker.is_current(&token) {
                        return self.abandoned(run_id);
                    }
                    return self.finish(
                        &token,
                        RunOutcome::Failed {
                            node_id: node.id.clone(),
                            error,
                        },
                    );
                }
            }
        }

        self.finish(&token, RunOutcome::Completed)
    }

    /// Skip whatever is still pending, stop the run and report `outcome`
    fn finish(&self, token: &RunToken, outcome: RunOutcome) -> RunOutcome {
        let run_id = token.run_id();
        for node_id in self.tracker.skip_pending(token) {
            self.emit(ExecutionEvent::NodeSkipped {
                run_id: run_id.to_string(),
                node_id,
            });
        }
        self.tracker.finish_run(token);
        self.emit(ExecutionEvent::RunFinished {
            run_id: run_id.to_string(),
            outcome: outcome.clone(),
        });
        outcome
    }

    fn abandoned(&self, run_id: &str) -> RunOutcome {
        log::info!("Run '{}' is no longer current, stopping", run_id);
        let outcome = RunOutcome::Cancelled;
        self.emit(ExecutionEvent::RunFinished {
            run_id: run_id.to_string(),
            outcome: outcome.clone(),
        });
        outcome
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Err(e) = self.event_sink.send(event) {
            log::warn!("Failed to deliver run event: {}", e);
        }
    }
}

impl<E: StepExecutor + 'static> RunDriver<E> {
    /// Drive a run on the tokio runtime without blocking the caller
    pub fn spawn_run(self: &Arc<Self>, run_id: impl Into<String>, nodes: Vec<GraphNode>) -> JoinHandle<RunOutcome> {
        let driver = Arc::clone(self);
        let run_id = run_id.into();
        tokio::spawn(async move { driver.drive_run(&run_id, &nodes).await })
    }
}

/// Input snapshot recorded when a node starts
fn synthesize_input(node: &GraphNode, previous_output: Option<&Value>) -> Value {
    json!({
        "nodeId": node.id,
        "kind": node.kind,
        "label": node.label(),
        "config": node.data,
        "previousOutput": previous_output.cloned().unwrap_or(Value::Null),
    })
}
