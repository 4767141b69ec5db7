//! Execution status tracking for workflow runs
//!
//! - [`ExecutionTracker`]: shared, observable per-node status of the current run
//! - [`RunDriver`]: advances a run node by node through a [`StepExecutor`]
//! - [`SimulatedExecutor`]: stand-in executor with random timing and failures

mod clock;
mod driver;
mod executor;
mod state;
mod tracker;

use serde::{Deserialize, Serialize};

pub use clock::{Clock, FixedClock, SystemClock};
pub use driver::RunDriver;
pub use executor::{SimulatedExecutor, StepExecutor, StepOutcome};
pub use state::{ExecutionNodeState, ExecutionRun, NodeStatePatch, NodeStatus, RunSummary, RunToken};
pub use tracker::ExecutionTracker;

/// How a driven run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RunOutcome {
    /// Every node succeeded
    Completed,
    /// A node failed; the nodes after it were skipped
    #[serde(rename_all = "camelCase")]
    Failed { node_id: String, error: String },
    /// The run was cleared or replaced before it finished
    Cancelled,
}
