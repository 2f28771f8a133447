#![deny(missing_docs)]
//! The `Db` and `Blob` capability traits the orchestrator passes to
//! tool executors via `ToolContext`, plus in-memory and filesystem
//! reference implementations.

pub mod blob;
pub mod db;
pub mod fs;
pub mod memory;

pub use blob::Blob;
pub use db::{Db, DbExt};
pub use fs::{FsBlob, FsDb};
pub use memory::{MemoryBlob, MemoryDb};
