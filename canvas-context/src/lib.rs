#![deny(missing_docs)]
//! Memory block reconciliation: pure functions that refresh an agent's
//! `MemoryBlockSet` from authoritative application state ahead of each
//! `sendMessage` call. No I/O lives here — the router reads whatever
//! `World`/`Story`/preferences/tool registry it already has in hand and
//! passes them in; this crate only knows how to fold that state into
//! the blocks the runtime will see.

pub mod reconcile;

pub use reconcile::{reconcile_experience_blocks, reconcile_user_blocks, reconcile_world_blocks};
