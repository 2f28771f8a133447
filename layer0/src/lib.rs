#![deny(missing_docs)]
//! Shared identifiers, the closed error taxonomy, and a stable duration
//! type used across every protocol boundary in this workspace: the
//! orchestrator, the tool registry, the canvas session manager, and
//! trajectory capture all speak in terms of these types rather than
//! inventing their own per-crate equivalents.

pub mod duration;
pub mod error;
pub mod id;

pub use duration::DurationMs;
pub use error::CanvasError;
pub use id::{
    AgentId, AssetId, ComponentId, SegmentId, StoryId, ToolCallId, TrajectoryId, TurnId, UserId,
    WorldId,
};
