//! The narrow capability tools dispatch canvas protocol traffic
//! through. The concrete multiplexer (per-user queues, subscribers,
//! GC) lives in `canvas-session`; tools only ever see this trait.

use async_trait::async_trait;
use canvas_types::{CanvasOp, Interaction, Suggestion};
use chrono::{DateTime, Utc};
use layer0::{CanvasError, UserId};

/// Outbound publish and inbound drain, scoped to one user at a time.
/// Implemented by `canvas_session::CanvasSessionManager`.
#[async_trait]
pub trait CanvasHandle: Send + Sync {
    /// Enqueue an outbound component-tree mutation for `user_id`,
    /// delivering it to any live subscribers immediately.
    async fn publish(&self, user_id: &UserId, op: CanvasOp) -> Result<(), CanvasError>;

    /// Enqueue a suggestion envelope for `user_id`, delivered over the
    /// same outbound transport but kept distinct from the component
    /// tree.
    async fn publish_suggestion(
        &self,
        user_id: &UserId,
        suggestion: Suggestion,
    ) -> Result<(), CanvasError>;

    /// Remove and return up to `max` queued inbound interactions for
    /// `user_id`, in FIFO order. Returns immediately with an empty list
    /// if none are queued.
    ///
    /// When `since` is given, only interactions received at or after it
    /// are removed and returned; older ones stay queued for a later,
    /// unfiltered (or differently filtered) call instead of being
    /// discarded. The queue is time-ordered, so the matching items are
    /// always a contiguous run starting from the first one `>= since`.
    async fn drain(
        &self,
        user_id: &UserId,
        max: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Interaction>, CanvasError>;
}
