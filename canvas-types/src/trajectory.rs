//! Trajectories: the durable record written once per orchestrator run.

use chrono::{DateTime, Utc};
use layer0::{AgentId, DurationMs, TrajectoryId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::turn::Turn;

/// How an orchestrator run ended, determining `outcome` downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// The stream ended naturally (`end_turn`).
    Completed,
    /// The approval loop hit its iteration cap (`TurnDiverged`).
    Incomplete,
    /// A runtime-level failure (e.g. `AgentRuntimeUnavailable`).
    Failed,
    /// An unexpected exception outside the known taxonomy.
    Error,
}

/// The heuristic summary of whether a run "worked", independent of
/// which exact error kind (if any) ended it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The run completed with no tool failures.
    Success,
    /// The run completed, hit the iteration cap, or had some tool
    /// failures but still produced output.
    PartialSuccess,
    /// The run failed outright.
    Failure,
}

impl Outcome {
    /// Derive the outcome from the execution status and the number of
    /// tool-call failures recorded across all turns.
    pub fn derive(status: ExecutionStatus, tool_failure_count: usize) -> Self {
        match status {
            ExecutionStatus::Completed if tool_failure_count == 0 => Outcome::Success,
            ExecutionStatus::Completed => Outcome::PartialSuccess,
            ExecutionStatus::Incomplete => Outcome::PartialSuccess,
            ExecutionStatus::Failed | ExecutionStatus::Error => Outcome::Failure,
        }
    }

    /// How much the outcome should be trusted, in `[0.0, 1.0]`. A simple
    /// function of the same two signals as [`Outcome::derive`]: a clean
    /// `end_turn` status starts at full confidence, an iteration-cap
    /// stop starts lower, and a runtime failure has none; each tool
    /// failure along the way chips away further.
    pub fn confidence(status: ExecutionStatus, tool_failure_count: usize) -> f64 {
        let penalty = 0.15 * tool_failure_count.min(5) as f64;
        match status {
            ExecutionStatus::Completed => (1.0 - penalty).max(0.25),
            ExecutionStatus::Incomplete => (0.5 - penalty).max(0.1),
            ExecutionStatus::Failed | ExecutionStatus::Error => 0.0,
        }
    }
}

/// Execution metadata captured alongside a trajectory's turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryMetadata {
    /// When the orchestrator run started.
    pub started_at: DateTime<Utc>,
    /// When the orchestrator run ended.
    pub ended_at: DateTime<Utc>,
    /// Total wall-clock duration of the run.
    pub duration: DurationMs,
    /// Number of approval batches processed (stream re-entries).
    pub approval_batches: u32,
    /// Names of every tool invoked during the run, in first-invocation
    /// order, without duplicates.
    pub tools_invoked: Vec<String>,
    /// Count of successful tool calls per tool name.
    pub tool_success_counts: Value,
    /// Count of failed tool calls per tool name.
    pub tool_failure_counts: Value,
}

/// The durable record of one completed orchestrator run, written once
/// on a best-effort basis by the trajectory sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    /// Stable identifier.
    pub trajectory_id: TrajectoryId,
    /// The agent this run executed against.
    pub agent_id: AgentId,
    /// How the run ended.
    pub execution_status: ExecutionStatus,
    /// Execution metadata.
    pub metadata: TrajectoryMetadata,
    /// The turns captured during this run (normally exactly one, since
    /// one `sendMessage` call is one turn; kept as a list for forward
    /// compatibility with multi-turn runs).
    pub turns: Vec<Turn>,
    /// The heuristic outcome, once computable.
    pub outcome: Option<Outcome>,
    /// Confidence in `outcome`, in `[0.0, 1.0]`. Present whenever
    /// `outcome` is.
    pub confidence: Option<f64>,
    /// When the trajectory record itself was written.
    pub created_at: DateTime<Utc>,
}
