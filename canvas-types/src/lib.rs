#![deny(missing_docs)]
//! The data model: agents, worlds, stories, assets, canvas protocol
//! payloads, turns, and trajectories. This crate has no executable
//! behavior beyond small invariant-preserving helpers — it exists so
//! every other crate in the workspace speaks the same entity shapes.

pub mod agent;
pub mod asset;
pub mod canvas;
pub mod story;
pub mod trajectory;
pub mod turn;
pub mod world;

pub use agent::{Agent, AgentKind, AgentScope, ContextKey, MemoryBlockSet};
pub use asset::Asset;
pub use canvas::{
    CanvasOp, ComponentChild, ComponentNode, Interaction, InteractionKind, OutboundEnvelope,
    Suggestion,
};
pub use story::{Segment, Story};
pub use trajectory::{ExecutionStatus, Outcome, Trajectory, TrajectoryMetadata};
pub use turn::{AgentMessage, StopReason, ToolCall, ToolCallRecord, Turn};
pub use world::World;
