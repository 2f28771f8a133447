//! Shared fixtures for this crate's `#[cfg(test)]` modules: a
//! `ToolContext` wired to in-memory reference implementations, with
//! variants that script provider failures.

#![cfg(test)]

use std::sync::Arc;

use canvas_provider::{ScriptedDraftProvider, ScriptedImageProvider};
use canvas_session::{CanvasSessionConfig, CanvasSessionManager};
use canvas_state::{MemoryBlob, MemoryDb};
use canvas_tool::ToolContext;
use chrono::{DateTime, Utc};
use layer0::UserId;

/// A fixed instant so assertions on `created_at`/`updated_at` don't flake.
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
}

/// A context for user `u1` with every provider available.
pub fn test_context() -> ToolContext {
    test_context_for(UserId::new("u1"))
}

/// A context for an arbitrary user, every provider available.
pub fn test_context_for(user_id: UserId) -> ToolContext {
    let (_, ctx) = test_context_with_session_for(user_id);
    ctx
}

/// Like [`test_context`], but also returns the concrete session manager
/// backing `ctx.canvas`, for tests that need to `ingest` an interaction
/// the way the transport layer would, ahead of a tool call.
pub fn test_context_with_session() -> (Arc<CanvasSessionManager>, ToolContext) {
    test_context_with_session_for(UserId::new("u1"))
}

fn test_context_with_session_for(user_id: UserId) -> (Arc<CanvasSessionManager>, ToolContext) {
    let session = Arc::new(CanvasSessionManager::new(CanvasSessionConfig::default()));
    let ctx = ToolContext::new(
        user_id,
        Arc::new(MemoryDb::new()),
        Arc::new(MemoryBlob::new()),
        vec![
            Arc::new(ScriptedImageProvider::available("gemini")),
            Arc::new(ScriptedImageProvider::available("openai")),
        ],
        Arc::new(ScriptedDraftProvider::available()),
        Arc::clone(&session) as _,
        fixed_now(),
    );
    (session, ctx)
}

/// A context sharing `db`/`blob`/`canvas` with another context but scoped
/// to a different user, for ownership-denial tests.
pub fn test_context_sharing_state(other: &ToolContext, user_id: UserId) -> ToolContext {
    ToolContext::new(
        user_id,
        Arc::clone(&other.db),
        Arc::clone(&other.blob),
        other.image_providers.clone(),
        Arc::clone(&other.draft_provider),
        Arc::clone(&other.canvas),
        other.now,
    )
}

/// A context whose draft provider always fails with `reason`.
pub fn test_context_with_failing_draft_provider(reason: &str) -> ToolContext {
    ToolContext::new(
        UserId::new("u1"),
        Arc::new(MemoryDb::new()),
        Arc::new(MemoryBlob::new()),
        vec![Arc::new(ScriptedImageProvider::available("gemini"))],
        Arc::new(ScriptedDraftProvider::unavailable(reason.to_owned())),
        Arc::new(CanvasSessionManager::new(CanvasSessionConfig::default())),
        fixed_now(),
    )
}

/// A context whose only image provider always fails with `reason`.
pub fn test_context_with_failing_image_provider(reason: &str) -> ToolContext {
    ToolContext::new(
        UserId::new("u1"),
        Arc::new(MemoryDb::new()),
        Arc::new(MemoryBlob::new()),
        vec![Arc::new(ScriptedImageProvider::unavailable("gemini", reason.to_owned()))],
        Arc::new(ScriptedDraftProvider::available()),
        Arc::new(CanvasSessionManager::new(CanvasSessionConfig::default())),
        fixed_now(),
    )
}
