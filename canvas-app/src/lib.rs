#![deny(missing_docs)]
//! The ambient composition root. `CanvasApp::new` wires a `Db`, a
//! `Blob` store, an `AgentRuntime`, a set of `ImageProvider`s, and a
//! `DraftProvider` into a running [`Orchestrator`] and
//! [`CanvasSessionManager`], using the tool registries `canvas-tools`
//! ships for each agent kind. A caller downstream of this crate has
//! one constructor and five methods; everything else is an
//! implementation detail.

pub mod config;

pub use config::CanvasConfig;

use std::sync::Arc;

use canvas_orch::{AgentRouter, KindRegistries, Orchestrator, SendMessageContext, SendMessageOutput, TrajectorySink};
use canvas_provider::{AgentRuntime, DraftProvider, ImageProvider};
use canvas_session::{CanvasSessionManager, CanvasSink, SubscriptionId};
use canvas_state::{Blob, Db};
use canvas_tool::CanvasHandle;
use canvas_types::Interaction;
use layer0::{CanvasError, UserId};

/// A fully wired canvas application: one [`Orchestrator`] and one
/// [`CanvasSessionManager`] sharing a [`AgentRouter`], ready to accept
/// `sendMessage` calls and canvas subscriptions.
pub struct CanvasApp {
    orchestrator: Orchestrator,
    sessions: Arc<CanvasSessionManager>,
    router: Arc<AgentRouter>,
}

impl CanvasApp {
    /// Build the composition root. `image_providers` are consulted by
    /// the `image_generator` tool in order; the first that reports
    /// itself available handles the call.
    pub fn new(
        db: Arc<dyn Db>,
        blob: Arc<dyn Blob>,
        runtime: Arc<dyn AgentRuntime>,
        image_providers: Vec<Arc<dyn ImageProvider>>,
        draft_provider: Arc<dyn DraftProvider>,
        trajectory_sink: Arc<dyn TrajectorySink>,
        config: CanvasConfig,
    ) -> Self {
        let router = Arc::new(AgentRouter::new(db.clone()));
        let sessions = Arc::new(CanvasSessionManager::new(config.canvas_session_config()));
        let registries = KindRegistries {
            user: canvas_tools::user_kind_registry(),
            world: canvas_tools::world_kind_registry(),
            experience: canvas_tools::experience_kind_registry(),
        };

        let orchestrator = Orchestrator::new(
            router.clone(),
            runtime,
            db,
            blob,
            image_providers,
            draft_provider,
            sessions.clone() as Arc<dyn CanvasHandle>,
            registries,
            trajectory_sink,
            config.orchestrator_config(),
        )
        .with_persona(config.persona.clone());

        Self { orchestrator, sessions, router }
    }

    /// Run one `sendMessage` turn. See [`Orchestrator::send_message`].
    pub async fn send_message(
        &self,
        user_id: &UserId,
        message: impl Into<String>,
        context: SendMessageContext,
    ) -> Result<SendMessageOutput, CanvasError> {
        self.orchestrator.send_message(user_id, message, context).await
    }

    /// Subscribe a sink to `user_id`'s canvas session, replaying
    /// nothing retroactively: only envelopes published after this call
    /// are delivered.
    pub async fn subscribe_canvas(&self, user_id: &UserId, sink: Arc<dyn CanvasSink>) -> SubscriptionId {
        self.sessions.subscribe(user_id, sink).await
    }

    /// Detach a previously subscribed sink.
    pub async fn unsubscribe_canvas(&self, user_id: &UserId, id: SubscriptionId) {
        self.sessions.unsubscribe(user_id, id).await
    }

    /// Queue an inbound interaction (e.g. a canvas-originated edit or
    /// approval click) for `user_id`'s session.
    pub async fn ingest_interaction(&self, user_id: &UserId, interaction: Interaction) -> Result<(), CanvasError> {
        self.sessions.ingest(user_id, interaction).await
    }

    /// Sweep idle, subscriber-less canvas sessions. Returns the number
    /// removed. A composition root is expected to call this on its own
    /// schedule; `canvas-app` does not run a background task itself.
    pub fn gc_canvas_sessions(&self) -> usize {
        self.sessions.gc()
    }

    /// The shared agent router, exposed for callers that need to
    /// resolve or inspect agent identity outside of a `sendMessage`
    /// call (e.g. an admin surface).
    pub fn router(&self) -> &Arc<AgentRouter> {
        &self.router
    }
}

/// Install a `tracing` subscriber reading its filter from `RUST_LOG`
/// (falling back to `info` when unset). A binary embedding `canvas-app`
/// calls this once at startup; the crate itself never does.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_orch::{InMemoryTrajectorySink, NoopTrajectorySink};
    use canvas_provider::{Chunk, ScriptedAgentRuntime, ScriptedDraftProvider, ScriptedImageProvider};
    use canvas_state::{MemoryBlob, MemoryDb};
    use canvas_types::{ExecutionStatus, OutboundEnvelope};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user_id() -> UserId {
        UserId::new("u-app-1")
    }

    #[tokio::test]
    async fn send_message_round_trips_through_a_fully_wired_app() {
        let db = Arc::new(MemoryDb::new());
        let blob = Arc::new(MemoryBlob::new());
        let runtime = Arc::new(ScriptedAgentRuntime::new(vec![vec![
            Ok(Chunk::AssistantText { text: "hello there".into() }),
            Ok(Chunk::StopReason { reason: "end_turn".into() }),
        ]]));
        let draft = Arc::new(ScriptedDraftProvider::available());
        let image = Arc::new(ScriptedImageProvider::available("gemini"));
        let trajectories = Arc::new(InMemoryTrajectorySink::new());

        let app = CanvasApp::new(
            db,
            blob,
            runtime,
            vec![image],
            draft,
            trajectories.clone(),
            CanvasConfig::default(),
        );

        let output = app
            .send_message(&user_id(), "hi", SendMessageContext::user())
            .await
            .expect("send_message should succeed");

        assert_eq!(output.execution_status, ExecutionStatus::Completed);
        assert_eq!(output.messages.len(), 1);
        assert_eq!(trajectories.all().len(), 1);
    }

    #[tokio::test]
    async fn canvas_subscription_and_gc_are_reachable_through_the_app() {
        let db = Arc::new(MemoryDb::new());
        let blob = Arc::new(MemoryBlob::new());
        let runtime = Arc::new(ScriptedAgentRuntime::new(vec![vec![
            Ok(Chunk::AssistantText { text: "ok".into() }),
            Ok(Chunk::StopReason { reason: "end_turn".into() }),
        ]]));
        let draft = Arc::new(ScriptedDraftProvider::available());
        let image = Arc::new(ScriptedImageProvider::available("gemini"));

        let app = CanvasApp::new(
            db,
            blob,
            runtime,
            vec![image],
            draft,
            Arc::new(NoopTrajectorySink),
            CanvasConfig::default(),
        );

        struct CountingSink(AtomicUsize);
        impl CanvasSink for CountingSink {
            fn deliver(&self, _envelope: OutboundEnvelope) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let id = app.subscribe_canvas(&user_id(), sink).await;
        app.unsubscribe_canvas(&user_id(), id).await;
        assert_eq!(app.gc_canvas_sessions(), 0);
    }
}
