//! Trajectory capture: the durable record written (best-effort) once
//! per orchestrator run. The sink is a narrow capability so the
//! orchestrator never depends on a storage backend directly — a `Db`-
//! backed sink, a logging-only sink, and an in-memory sink for tests
//! all implement the same trait.

use std::sync::Mutex;

use async_trait::async_trait;
use canvas_state::Db;
use canvas_types::Trajectory;
use layer0::CanvasError;
use std::sync::Arc;

use crate::keys;

/// Observes a completed (or failed) orchestrator run and writes a
/// structured record. Writes are best-effort: a failing sink must not
/// fail the user's turn, so the orchestrator only logs a sink error,
/// never propagates it.
#[async_trait]
pub trait TrajectorySink: Send + Sync {
    /// Persist one trajectory record.
    async fn write(&self, trajectory: Trajectory) -> Result<(), CanvasError>;
}

/// Discards every trajectory. Used when `trajectory_capture_enabled` is
/// off, or by callers that don't care about the capture surface at all.
pub struct NoopTrajectorySink;

#[async_trait]
impl TrajectorySink for NoopTrajectorySink {
    async fn write(&self, _trajectory: Trajectory) -> Result<(), CanvasError> {
        Ok(())
    }
}

/// Writes each trajectory as its own row, keyed by `trajectory_id`, via
/// the same narrow `Db` capability tools use. One of several valid
/// sink choices; the trajectory record shape is what callers can rely
/// on, not where it ends up stored.
pub struct DbTrajectorySink {
    db: Arc<dyn Db>,
}

impl DbTrajectorySink {
    /// Build a sink writing through `db`.
    pub fn new(db: Arc<dyn Db>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TrajectorySink for DbTrajectorySink {
    async fn write(&self, trajectory: Trajectory) -> Result<(), CanvasError> {
        let key = keys::trajectory(&trajectory.trajectory_id);
        let value = serde_json::to_value(&trajectory).map_err(|e| CanvasError::Internal(e.to_string()))?;
        self.db.write(&key, value).await
    }
}

/// Collects every written trajectory in memory, for orchestrator tests
/// that assert on `executionStatus` / `metadata` without a `Db`.
#[derive(Default)]
pub struct InMemoryTrajectorySink {
    trajectories: Mutex<Vec<Trajectory>>,
}

impl InMemoryTrajectorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every trajectory written so far, in write order.
    pub fn all(&self) -> Vec<Trajectory> {
        self.trajectories.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrajectorySink for InMemoryTrajectorySink {
    async fn write(&self, trajectory: Trajectory) -> Result<(), CanvasError> {
        self.trajectories
            .lock()
            .map_err(|_| CanvasError::Internal("trajectory sink lock poisoned".into()))?
            .push(trajectory);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_types::{ExecutionStatus, TrajectoryMetadata};
    use chrono::Utc;
    use layer0::{AgentId, DurationMs, TrajectoryId};

    fn sample() -> Trajectory {
        let now = Utc::now();
        Trajectory {
            trajectory_id: TrajectoryId::new("t1"),
            agent_id: AgentId::new("a1"),
            execution_status: ExecutionStatus::Completed,
            metadata: TrajectoryMetadata {
                started_at: now,
                ended_at: now,
                duration: DurationMs::ZERO,
                approval_batches: 0,
                tools_invoked: vec![],
                tool_success_counts: serde_json::json!({}),
                tool_failure_counts: serde_json::json!({}),
            },
            turns: vec![],
            outcome: None,
            confidence: None,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn noop_sink_discards() {
        let sink = NoopTrajectorySink;
        sink.write(sample()).await.unwrap();
    }

    #[tokio::test]
    async fn in_memory_sink_collects_writes() {
        let sink = InMemoryTrajectorySink::new();
        sink.write(sample()).await.unwrap();
        sink.write(sample()).await.unwrap();
        assert_eq!(sink.all().len(), 2);
    }

    #[tokio::test]
    async fn db_sink_round_trips_through_storage() {
        let db: Arc<dyn Db> = Arc::new(canvas_state::MemoryDb::new());
        let sink = DbTrajectorySink::new(Arc::clone(&db));
        sink.write(sample()).await.unwrap();
        let raw = db.read(&keys::trajectory(&TrajectoryId::new("t1"))).await.unwrap();
        assert!(raw.is_some());
    }
}
