//! `ToolContext`: the uniform capability bundle passed to every tool
//! call.

use std::sync::Arc;

use canvas_provider::{DraftProvider, ImageProvider};
use canvas_state::{Blob, Db};
use chrono::{DateTime, Utc};
use layer0::UserId;

use crate::canvas::CanvasHandle;

/// `(args, ToolContext) -> ToolResult` is the whole tool contract.
/// Every field is a narrow capability trait object so a tool never
/// reaches outside what it was granted.
#[derive(Clone)]
pub struct ToolContext {
    /// The authenticated caller. Every tool that touches an owned
    /// entity checks this against the entity's `owner_user_id`.
    pub user_id: UserId,
    /// Narrow key/value access to application state.
    pub db: Arc<dyn Db>,
    /// Opaque-keyed binary object storage.
    pub blob: Arc<dyn Blob>,
    /// Image-generation backends `image_generator` can call, in
    /// fallback-priority order. An explicit `provider` argument is
    /// matched by [`ImageProvider::name`] first; otherwise the first
    /// provider in this list that succeeds wins.
    pub image_providers: Vec<Arc<dyn ImageProvider>>,
    /// The text/LLM backend `world_draft_generator` calls.
    pub draft_provider: Arc<dyn DraftProvider>,
    /// The canvas protocol handle `canvas_ui`, `get_canvas_interactions`
    /// and `send_suggestion` dispatch through.
    pub canvas: Arc<dyn CanvasHandle>,
    /// The orchestrator's notion of "now" for this tool call, injected
    /// rather than read from the system clock so executors stay
    /// deterministic under test.
    pub now: DateTime<Utc>,
}

impl ToolContext {
    /// Construct a context for a single tool invocation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        db: Arc<dyn Db>,
        blob: Arc<dyn Blob>,
        image_providers: Vec<Arc<dyn ImageProvider>>,
        draft_provider: Arc<dyn DraftProvider>,
        canvas: Arc<dyn CanvasHandle>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            db,
            blob,
            image_providers,
            draft_provider,
            canvas,
            now,
        }
    }
}
