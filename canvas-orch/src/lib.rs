#![deny(missing_docs)]
//! The top of the agent-call stack: the router that resolves a
//! `(userId, kind, scope)` to a durable `AgentId`, and the
//! approval-driven orchestrator loop that turns one `sendMessage` call
//! into a stream of agent-runtime round-trips, tool executions, and a
//! trajectory record.

pub mod keys;
pub mod orchestrator;
pub mod router;
pub mod trajectory;

pub use orchestrator::{
    Cancellation, KindRegistries, NeverCancelled, Orchestrator, OrchestratorConfig, SendMessageContext, SendMessageOutput,
};
pub use router::AgentRouter;
pub use trajectory::{DbTrajectorySink, InMemoryTrajectorySink, NoopTrajectorySink, TrajectorySink};
