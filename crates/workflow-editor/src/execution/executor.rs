//! Step execution boundary
//!
//! The run driver does not perform work itself. It hands each node to a
//! [`StepExecutor`] and records the outcome. A production host plugs in an
//! executor that talks to the real backend; [`SimulatedExecutor`] stands in
//! for it with random processing time and injected failures.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use crate::config::SimulationConfig;
use crate::types::{GraphNode, NodeId, NodeKind};

/// Result of executing one step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Success { output: Value },
    Failure { error: String },
}

impl StepOutcome {
    pub fn success(output: Value) -> Self {
        Self::Success { output }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }
}

/// Something that carries out a single workflow step
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Execute `node` with the synthesized `input`
    ///
    /// Failures are reported as [`StepOutcome::Failure`], never as panics.
    async fn execute(&self, node: &GraphNode, input: &Value) -> StepOutcome;
}

/// Executor that simulates work
pub struct SimulatedExecutor {
    config: SimulationConfig,
    rng: Mutex<StdRng>,
    forced_failures: HashSet<NodeId>,
}

impl SimulatedExecutor {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
            forced_failures: HashSet::new(),
        }
    }

    /// Always fail the node with this id
    pub fn with_forced_failure(mut self, node_id: impl Into<NodeId>) -> Self {
        self.forced_failures.insert(node_id.into());
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Pick processing time and pass/fail for one step
    fn roll(&self, node_id: &str) -> (Duration, bool) {
        let mut rng = self.rng.lock();
        let (min, max) = (self.config.min_processing_ms, self.config.max_processing_ms);
        let millis = if min >= max { min } else { rng.gen_range(min..=max) };
        let fails =
            self.forced_failures.contains(node_id) || rng.gen::<f64>() < self.config.failure_rate;
        (Duration::from_millis(millis), fails)
    }
}

#[async_trait]
impl StepExecutor for SimulatedExecutor {
    async fn execute(&self, node: &GraphNode, _input: &Value) -> StepOutcome {
        let (processing, fails) = self.roll(&node.id);
        tokio::time::sleep(processing).await;

        if fails {
            StepOutcome::failure(simulated_error(node.kind))
        } else {
            StepOutcome::success(simulated_output(node, processing))
        }
    }
}

fn simulated_error(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Trigger => "Trigger payload could not be parsed",
        NodeKind::AgentAction => "Agent did not respond before the timeout",
        NodeKind::Condition => "Condition expression could not be evaluated",
        NodeKind::Delay => "Delay was interrupted",
        NodeKind::Transform => "Transform expression produced an invalid value",
        NodeKind::Output => "Output destination rejected the result",
        NodeKind::Loop => "Loop exceeded its maximum iterations",
        NodeKind::Parallel => "A parallel branch failed",
        NodeKind::HttpRequest => "HTTP request failed with status 503",
        NodeKind::Code => "Script exited with a runtime error",
        NodeKind::ApprovalGate => "Approval request was rejected",
        NodeKind::SubWorkflow => "Sub-workflow run failed",
    }
}

fn simulated_output(node: &GraphNode, processing: Duration) -> Value {
    let detail = match node.kind {
        NodeKind::Trigger => json!({ "triggered": true }),
        NodeKind::AgentAction => json!({ "response": format!("{} completed its task", node.label()) }),
        NodeKind::Condition => json!({ "result": true, "branch": "true" }),
        NodeKind::Delay => json!({ "waited": node.data.get("duration").cloned().unwrap_or(Value::Null) }),
        NodeKind::Transform => json!({ "transformed": true }),
        NodeKind::Output => json!({ "delivered": true }),
        NodeKind::Loop => json!({ "iterations": node.data.get("maxIterations").cloned().unwrap_or(json!(0)) }),
        NodeKind::Parallel => json!({ "branches": ["branchA", "branchB"] }),
        NodeKind::HttpRequest => json!({ "status": 200 }),
        NodeKind::Code => json!({ "exitCode": 0 }),
        NodeKind::ApprovalGate => json!({ "approved": true, "branch": "approved" }),
        NodeKind::SubWorkflow => json!({ "workflowId": node.data.get("workflowId").cloned().unwrap_or(Value::Null) }),
    };
    json!({
        "nodeId": node.id,
        "kind": node.kind,
        "durationMs": processing.as_millis() as u64,
        "result": detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::types::Position;

    fn node(id: &str, kind: NodeKind) -> GraphNode {
        GraphNode::new(id, kind, Position::default(), catalog::entry(kind).default_data())
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_failure() {
        let executor = SimulatedExecutor::new(SimulationConfig::never_fail()).with_forced_failure("bad");

        let ok = executor.execute(&node("good", NodeKind::HttpRequest), &Value::Null).await;
        match ok {
            StepOutcome::Success { output } => {
                assert_eq!(output["nodeId"], "good");
                assert_eq!(output["result"]["status"], 200);
            }
            other => panic!("Expected success, got {:?}", other),
        }

        let failed = executor.execute(&node("bad", NodeKind::HttpRequest), &Value::Null).await;
        assert_eq!(failed, StepOutcome::failure("HTTP request failed with status 503"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_time_within_bounds() {
        let config = SimulationConfig {
            min_processing_ms: 200,
            max_processing_ms: 400,
            failure_rate: 0.0,
            seed: Some(42),
            ..SimulationConfig::default()
        };
        let executor = SimulatedExecutor::new(config);

        let start = tokio::time::Instant::now();
        executor.execute(&node("n", NodeKind::Code), &Value::Null).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed <= Duration::from_millis(401));
    }

    #[test]
    fn test_always_fail_rate() {
        let config = SimulationConfig {
            failure_rate: 1.0,
            seed: Some(1),
            ..SimulationConfig::default()
        };
        let executor = SimulatedExecutor::new(config);
        for _ in 0..20 {
            assert!(executor.roll("n").1);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let config = SimulationConfig {
            seed: Some(9),
            ..SimulationConfig::default()
        };
        let a = SimulatedExecutor::new(config.clone());
        let b = SimulatedExecutor::new(config);
        for _ in 0..10 {
            assert_eq!(a.roll("n"), b.roll("n"));
        }
    }
}
