#![deny(missing_docs)]
//! The capabilities the orchestrator consumes from the external agent
//! runtime and from image-generation providers, plus scripted/in-memory
//! implementations used in tests.
//!
//! [`AgentRuntime`] is the streaming `messages.create` protocol: the
//! orchestrator opens a stream, accumulates chunks, and posts approval
//! results back as a new `messages.create` call.
//! [`ImageProvider`] is the single capability `image_generator` invokes.

pub mod draft;
pub mod image;
pub mod runtime;
pub mod types;

pub use draft::{DraftProvider, ScriptedDraftProvider, WorldDraft};
pub use image::{GeneratedImage, ImageProvider, ScriptedImageProvider};
pub use runtime::{AgentRuntime, ChunkStream, ScriptedAgentRuntime};
pub use types::{ApprovalResult, ApprovalStatus, Chunk, RuntimeInput, ToolDescriptor};
