#![deny(missing_docs)]
//! The canvas session manager: a per-user multiplexer between tools
//! (`canvas_ui`, `get_canvas_interactions`, `send_suggestion`) and the
//! browser's duplex transport.

pub mod manager;
pub mod sink;

pub use manager::{CanvasSessionConfig, CanvasSessionManager};
pub use sink::{CanvasSink, SubscriptionId};
