#![deny(missing_docs)]
//! The tool substrate: the `ToolDyn` contract, the `ToolRegistry`
//! dispatch table, the `ToolContext` capability bundle, and the narrow
//! `CanvasHandle` trait tools use to reach the canvas protocol.
//!
//! Concrete tools (`world_manager`, `image_generator`, `canvas_ui`, ...)
//! live in `canvas-tools`; this crate only defines the contract they
//! implement.

pub mod canvas;
pub mod context;
pub mod error;
pub mod registry;

pub use canvas::CanvasHandle;
pub use context::ToolContext;
pub use error::ToolError;
pub use registry::{ToolDyn, ToolRegistry};
