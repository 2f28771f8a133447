//! The approval-driven `sendMessage` loop: the single entry point that
//! turns one user message into zero or more tool-execution batches
//! against the external agent runtime, and a trajectory record.

use std::collections::HashMap;
use std::sync::Arc;

use canvas_provider::{AgentRuntime, ApprovalResult, ApprovalStatus, Chunk, DraftProvider, ImageProvider, RuntimeInput, ToolDescriptor};
use canvas_state::{Blob, Db};
use canvas_tool::{CanvasHandle, ToolContext, ToolRegistry};
use canvas_types::agent::AgentKind;
use canvas_types::trajectory::{ExecutionStatus, Outcome, Trajectory, TrajectoryMetadata};
use canvas_types::turn::{AgentMessage, StopReason, ToolCall, ToolCallRecord, Turn};
use canvas_types::World;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use layer0::{AgentId, CanvasError, DurationMs, StoryId, TrajectoryId, TurnId, UserId, WorldId};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::keys;
use crate::router::AgentRouter;
use crate::trajectory::TrajectorySink;

/// Tunable knobs for one orchestrator instance. Defaults match the
/// values recommended in the approval-loop contract; a composition
/// root overriding them from the environment should keep
/// `max_approval_iterations` well above the number of tool calls a
/// normal turn makes, since it exists to catch divergence, not to
/// bound ordinary work.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Approval batches (stream re-entries) allowed before a turn is
    /// declared diverged.
    pub max_approval_iterations: u32,
    /// How long a single stream read may sit idle before the
    /// orchestrator treats it as a transport failure.
    pub idle_stream_timeout: DurationMs,
    /// Per-tool-call execution timeout, used when `tool_timeouts` has
    /// no entry for the tool's name.
    pub default_tool_timeout: DurationMs,
    /// Per-tool overrides of `default_tool_timeout` (e.g. image
    /// generation runs longer than a plain state mutation).
    pub tool_timeouts: HashMap<String, DurationMs>,
    /// Bounded retry attempts for a stream that fails to open or fails
    /// mid-read, before the turn fails with `AgentRuntimeUnavailable`.
    pub max_stream_retries: u32,
    /// Base delay for the exponential backoff between stream retries.
    pub retry_backoff_base: DurationMs,
    /// Whether a trajectory record is written at all. Independent of
    /// which `TrajectorySink` is wired in, so a composition root can
    /// disable capture without swapping the sink implementation.
    pub trajectory_capture_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let mut tool_timeouts = HashMap::new();
        tool_timeouts.insert("image_generator".to_owned(), DurationMs::from_secs(180));
        Self {
            max_approval_iterations: 16,
            idle_stream_timeout: DurationMs::from_secs(120),
            default_tool_timeout: DurationMs::from_secs(60),
            tool_timeouts,
            max_stream_retries: 3,
            retry_backoff_base: DurationMs::from_millis(200),
            trajectory_capture_enabled: true,
        }
    }
}

/// Signals that the calling transport has gone away. Checked at each
/// suspension point (before opening a stream, before dispatching each
/// tool call in a batch) so the orchestrator can abandon a run without
/// interrupting work already in flight.
pub trait Cancellation: Send + Sync {
    /// Whether the caller that started this run is still there.
    fn is_cancelled(&self) -> bool;
}

/// The default: a run is never cancelled.
pub struct NeverCancelled;

impl Cancellation for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Which agent a `sendMessage` call targets, and the scope it carries.
/// The caller (the transport layer mediating a particular surface —
/// a world editor, a general assistant pane, the canvas experience)
/// already knows which kind of conversation this is; the orchestrator
/// does not infer it from the message text.
pub struct SendMessageContext {
    /// The agent kind this message is addressed to.
    pub kind: AgentKind,
    /// Required when `kind` is `World`; ignored otherwise.
    pub world_id: Option<WorldId>,
    /// Folded into the `current_story` memory block for a World-kind
    /// turn when present; has no effect for other kinds.
    pub story_id: Option<StoryId>,
    /// Checked at each suspension point during the run.
    pub cancellation: Arc<dyn Cancellation>,
}

impl SendMessageContext {
    /// A User-kind turn.
    pub fn user() -> Self {
        Self {
            kind: AgentKind::User,
            world_id: None,
            story_id: None,
            cancellation: Arc::new(NeverCancelled),
        }
    }

    /// A World-kind turn scoped to `world_id`.
    pub fn world(world_id: WorldId) -> Self {
        Self {
            kind: AgentKind::World,
            world_id: Some(world_id),
            story_id: None,
            cancellation: Arc::new(NeverCancelled),
        }
    }

    /// An Experience-kind turn.
    pub fn experience() -> Self {
        Self {
            kind: AgentKind::Experience,
            world_id: None,
            story_id: None,
            cancellation: Arc::new(NeverCancelled),
        }
    }

    /// Fold a story into context (World-kind turns only).
    pub fn with_story(mut self, story_id: StoryId) -> Self {
        self.story_id = Some(story_id);
        self
    }

    /// Replace the default never-cancelled signal.
    pub fn with_cancellation(mut self, cancellation: Arc<dyn Cancellation>) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// The result of one `sendMessage` call: everything the caller needs
/// to render the turn, independent of whatever was (best-effort)
/// written to the trajectory sink.
#[derive(Debug, Clone)]
pub struct SendMessageOutput {
    /// Every assistant message produced during the turn, in order.
    pub messages: Vec<AgentMessage>,
    /// Every tool call attempted, in the order the agent requested
    /// them.
    pub tool_calls: Vec<ToolCallRecord>,
    /// How the run ended. `Incomplete` (the iteration cap was hit) is
    /// still a normal result, not an error — only a transport failure
    /// past its retry budget surfaces as `Err`.
    pub execution_status: ExecutionStatus,
    /// Execution metadata, identical to what was (attempted to be)
    /// written to the trajectory sink.
    pub metadata: TrajectoryMetadata,
}

/// Tool registries scoped to each agent kind. An agent can only ever
/// reach the registry for its own kind — never a name from another
/// kind's set, even by typo, since there is no shared global table to
/// fall through to.
pub struct KindRegistries {
    /// Tools permitted for User-kind agents.
    pub user: ToolRegistry,
    /// Tools permitted for World-kind agents.
    pub world: ToolRegistry,
    /// Tools permitted for Experience-kind agents.
    pub experience: ToolRegistry,
}

impl KindRegistries {
    fn get(&self, kind: AgentKind) -> &ToolRegistry {
        match kind {
            AgentKind::User => &self.user,
            AgentKind::World => &self.world,
            AgentKind::Experience => &self.experience,
        }
    }
}

const DEFAULT_PERSONA: &str = "You are a collaborative world-building and story-writing assistant.";

/// Drives the approval loop for one agent kind's worth of turns. Holds
/// every capability a tool call might need so `ToolContext` can be
/// assembled fresh per dispatched call.
pub struct Orchestrator {
    router: Arc<AgentRouter>,
    runtime: Arc<dyn AgentRuntime>,
    db: Arc<dyn Db>,
    blob: Arc<dyn Blob>,
    image_providers: Vec<Arc<dyn ImageProvider>>,
    draft_provider: Arc<dyn DraftProvider>,
    canvas: Arc<dyn CanvasHandle>,
    registries: KindRegistries,
    trajectory_sink: Arc<dyn TrajectorySink>,
    config: OrchestratorConfig,
    persona: String,
}

#[allow(clippy::too_many_arguments)]
impl Orchestrator {
    /// Build an orchestrator wiring together every capability a turn
    /// may need.
    pub fn new(
        router: Arc<AgentRouter>,
        runtime: Arc<dyn AgentRuntime>,
        db: Arc<dyn Db>,
        blob: Arc<dyn Blob>,
        image_providers: Vec<Arc<dyn ImageProvider>>,
        draft_provider: Arc<dyn DraftProvider>,
        canvas: Arc<dyn CanvasHandle>,
        registries: KindRegistries,
        trajectory_sink: Arc<dyn TrajectorySink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            router,
            runtime,
            db,
            blob,
            image_providers,
            draft_provider,
            canvas,
            registries,
            trajectory_sink,
            config,
            persona: DEFAULT_PERSONA.to_owned(),
        }
    }

    /// Override the default persona text folded into the `persona`
    /// memory block for User-kind agents.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// Run one turn: resolve the target agent, reconcile its memory
    /// blocks, open the agent runtime stream, and execute tool calls
    /// until a terminal stop reason or the iteration cap is reached.
    pub async fn send_message(
        &self,
        user_id: &UserId,
        message: impl Into<String>,
        context: SendMessageContext,
    ) -> Result<SendMessageOutput, CanvasError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(CanvasError::ValidationError("message must not be empty".into()));
        }
        if matches!(context.kind, AgentKind::World) && context.world_id.is_none() {
            return Err(CanvasError::ValidationError("a World-kind turn requires worldId".into()));
        }

        let started_at = Utc::now();
        let agent_id = self.resolve_agent(user_id, &context).await?;
        self.reconcile_memory(&agent_id, user_id, &context).await;

        let registry = self.registries.get(context.kind);
        let client_tools = descriptors_for(registry);

        let turn_id = TurnId::new(Uuid::new_v4().to_string());
        let mut turn = Turn::new(turn_id, user_id.clone(), agent_id.clone(), message.clone(), started_at);

        let mut current_input = vec![RuntimeInput::UserMessage { text: message }];
        let mut approval_batches: u32 = 0;
        let mut tools_invoked: Vec<String> = Vec::new();
        let mut success_counts: HashMap<String, u32> = HashMap::new();
        let mut failure_counts: HashMap<String, u32> = HashMap::new();

        let (execution_status, final_stop_reason) = loop {
            if context.cancellation.is_cancelled() {
                break (ExecutionStatus::Incomplete, StopReason::Other("cancelled".into()));
            }
            if approval_batches >= self.config.max_approval_iterations {
                tracing::warn!(
                    turn_id = %turn.turn_id,
                    agent_id = %agent_id,
                    approval_batches,
                    "{}",
                    CanvasError::TurnDiverged(format!("exceeded {} approval batches", self.config.max_approval_iterations)),
                );
                break (ExecutionStatus::Incomplete, StopReason::Other("turn_diverged".into()));
            }

            let acc = match self.run_stream(&agent_id, current_input.clone(), client_tools.clone()).await {
                Ok(acc) => acc,
                Err(e) => {
                    let ended_at = Utc::now();
                    turn.close(StopReason::Other(e.kind().to_owned()), ended_at);
                    let metadata = build_metadata(started_at, ended_at, approval_batches, tools_invoked, success_counts, failure_counts);
                    self.emit_trajectory(&agent_id, ExecutionStatus::Failed, turn, metadata).await;
                    return Err(e);
                }
            };

            turn.output_messages.extend(acc.messages);
            let stop_reason = acc.stop_reason.unwrap_or(StopReason::Other("missing_stop_reason".into()));

            if stop_reason.is_terminal() {
                break (ExecutionStatus::Completed, stop_reason);
            }

            approval_batches += 1;
            let mut approvals = Vec::with_capacity(acc.calls.len());
            let mut cancelled_mid_batch = false;
            for call in acc.calls {
                if context.cancellation.is_cancelled() {
                    cancelled_mid_batch = true;
                    break;
                }
                let (result, success, error_kind) = self.dispatch_tool(&call, registry, user_id).await;
                if let Some(name) = &call.tool_name {
                    if !tools_invoked.contains(name) {
                        tools_invoked.push(name.clone());
                    }
                    let counter = if success { &mut success_counts } else { &mut failure_counts };
                    *counter.entry(name.clone()).or_insert(0) += 1;
                }
                turn.tool_calls.push(ToolCallRecord {
                    tool_call_id: call.tool_call_id.clone(),
                    tool_name: call.tool_name.clone(),
                    success,
                    error_kind,
                });
                approvals.push(ApprovalResult {
                    tool_call_id: call.tool_call_id,
                    status: if success { ApprovalStatus::Ok } else { ApprovalStatus::Error },
                    result,
                });
            }

            if cancelled_mid_batch {
                break (ExecutionStatus::Incomplete, StopReason::Other("cancelled".into()));
            }

            current_input = vec![RuntimeInput::Approval { approvals }];
        };

        let ended_at = Utc::now();
        turn.close(final_stop_reason, ended_at);
        let metadata = build_metadata(started_at, ended_at, approval_batches, tools_invoked, success_counts, failure_counts);
        let messages = turn.output_messages.clone();
        let tool_calls = turn.tool_calls.clone();
        self.emit_trajectory(&agent_id, execution_status, turn, metadata.clone()).await;

        Ok(SendMessageOutput { messages, tool_calls, execution_status, metadata })
    }

    async fn resolve_agent(&self, user_id: &UserId, context: &SendMessageContext) -> Result<AgentId, CanvasError> {
        match context.kind {
            AgentKind::User => self.router.get_or_create_user_agent(user_id).await,
            AgentKind::World => {
                let world_id = context
                    .world_id
                    .as_ref()
                    .ok_or_else(|| CanvasError::ValidationError("a World-kind turn requires worldId".into()))?;
                self.router.get_or_create_world_agent(user_id, world_id).await
            }
            AgentKind::Experience => self.router.get_or_create_experience_agent(user_id).await,
        }
    }

    async fn reconcile_memory(&self, agent_id: &AgentId, user_id: &UserId, context: &SendMessageContext) {
        if let Err(e) = self.reconcile_memory_inner(agent_id, user_id, context).await {
            tracing::warn!(agent_id = %agent_id, error = %e, "memory reconciliation failed; continuing with existing blocks");
        }
    }

    async fn reconcile_memory_inner(&self, agent_id: &AgentId, user_id: &UserId, context: &SendMessageContext) -> Result<(), CanvasError> {
        let mut agent = self.router.load_agent(agent_id).await?;
        let changed = match context.kind {
            AgentKind::User => {
                let preferences = self.db.read(&keys::preferences(user_id)).await?.unwrap_or_else(|| json!({}));
                canvas_context::reconcile_user_blocks(&mut agent.memory_block_set, &self.persona, &preferences)
            }
            AgentKind::World => {
                let world_id = context
                    .world_id
                    .as_ref()
                    .ok_or_else(|| CanvasError::ValidationError("a World-kind turn requires worldId".into()))?;
                let world = self.load_world(world_id).await?;
                let story = match &context.story_id {
                    Some(story_id) => Some(self.router.load_story(story_id).await?),
                    None => None,
                };
                canvas_context::reconcile_world_blocks(&mut agent.memory_block_set, &world, story.as_ref())
            }
            AgentKind::Experience => {
                canvas_context::reconcile_experience_blocks(&mut agent.memory_block_set, self.registries.get(AgentKind::Experience))
            }
        };
        if changed {
            self.router.save_agent(&agent).await?;
        }
        Ok(())
    }

    async fn load_world(&self, world_id: &WorldId) -> Result<World, CanvasError> {
        let raw = self
            .db
            .read(&keys::world(world_id))
            .await?
            .ok_or_else(|| CanvasError::NotFound(format!("world {world_id}")))?;
        serde_json::from_value(raw).map_err(|e| CanvasError::Internal(e.to_string()))
    }

    async fn run_stream(&self, agent_id: &AgentId, input: Vec<RuntimeInput>, client_tools: Vec<ToolDescriptor>) -> Result<StreamAccumulator, CanvasError> {
        let mut attempt = 0u32;
        loop {
            match self.try_stream_once(agent_id, input.clone(), client_tools.clone()).await {
                Ok(acc) => return Ok(acc),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.config.max_stream_retries {
                        return Err(CanvasError::AgentRuntimeUnavailable(e.to_string()));
                    }
                    let backoff_ms = self.config.retry_backoff_base.as_millis().saturating_mul(1u64 << (attempt - 1));
                    tracing::warn!(attempt, error = %e, backoff_ms, "agent runtime stream failed, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    async fn try_stream_once(&self, agent_id: &AgentId, input: Vec<RuntimeInput>, client_tools: Vec<ToolDescriptor>) -> Result<StreamAccumulator, CanvasError> {
        let mut stream = self.runtime.messages_create(agent_id, input, client_tools).await?;
        let mut acc = StreamAccumulator::default();
        loop {
            let next = tokio::time::timeout(self.config.idle_stream_timeout.to_std(), stream.next())
                .await
                .map_err(|_| CanvasError::AgentRuntimeUnavailable("stream idle timeout".into()))?;
            match next {
                None => return Err(CanvasError::AgentRuntimeUnavailable("stream ended without a stop reason".into())),
                Some(Err(e)) => return Err(e),
                Some(Ok(Chunk::AssistantText { text })) => acc.messages.push(AgentMessage { text }),
                Some(Ok(Chunk::ApprovalRequestMessage { tool_call_id, tool_name, arguments_delta })) => {
                    acc.call_mut(tool_call_id).push_delta(tool_name.as_deref(), &arguments_delta);
                }
                Some(Ok(Chunk::StopReason { reason })) => {
                    acc.stop_reason = Some(StopReason::from_wire(&reason));
                    return Ok(acc);
                }
            }
        }
    }

    async fn dispatch_tool(&self, call: &ToolCall, registry: &ToolRegistry, user_id: &UserId) -> (Value, bool, Option<String>) {
        let Some(tool_name) = call.tool_name.clone() else {
            return (error_payload("ValidationError", "tool call never received a tool name"), false, Some("ValidationError".into()));
        };
        let parsed: Value = match serde_json::from_str(&call.arguments_raw) {
            Ok(v) => v,
            Err(e) => {
                return (
                    error_payload("ValidationError", &format!("invalid JSON arguments for {tool_name}: {e}")),
                    false,
                    Some("ValidationError".into()),
                );
            }
        };
        let Some(tool) = registry.get(&tool_name) else {
            return (error_payload("ValidationError", &format!("unknown tool: {tool_name}")), false, Some("ValidationError".into()));
        };

        let ctx = ToolContext::new(
            user_id.clone(),
            Arc::clone(&self.db),
            Arc::clone(&self.blob),
            self.image_providers.clone(),
            Arc::clone(&self.draft_provider),
            Arc::clone(&self.canvas),
            Utc::now(),
        );
        let timeout = self.tool_timeout_for(&tool_name);
        match tokio::time::timeout(timeout.to_std(), tool.call(parsed, &ctx)).await {
            Ok(Ok(value)) => (value, true, None),
            Ok(Err(tool_err)) => {
                let kind = tool_err.kind().to_owned();
                (error_payload(&kind, &tool_err.to_string()), false, Some(kind))
            }
            Err(_) => (error_payload("Internal", &format!("tool {tool_name} timed out")), false, Some("Internal".into())),
        }
    }

    fn tool_timeout_for(&self, tool_name: &str) -> DurationMs {
        self.config.tool_timeouts.get(tool_name).copied().unwrap_or(self.config.default_tool_timeout)
    }

    async fn emit_trajectory(&self, agent_id: &AgentId, status: ExecutionStatus, turn: Turn, metadata: TrajectoryMetadata) {
        if !self.config.trajectory_capture_enabled {
            return;
        }
        let failure_count: u64 = turn.tool_calls.iter().filter(|t| !t.success).count() as u64;
        let outcome = Outcome::derive(status, failure_count as usize);
        let confidence = Outcome::confidence(status, failure_count as usize);
        let trajectory = Trajectory {
            trajectory_id: TrajectoryId::new(Uuid::new_v4().to_string()),
            agent_id: agent_id.clone(),
            execution_status: status,
            metadata,
            turns: vec![turn],
            outcome: Some(outcome),
            confidence: Some(confidence),
            created_at: Utc::now(),
        };
        if let Err(e) = self.trajectory_sink.write(trajectory).await {
            tracing::warn!(agent_id = %agent_id, error = %e, "trajectory capture failed");
        }
    }
}

fn descriptors_for(registry: &ToolRegistry) -> Vec<ToolDescriptor> {
    registry
        .iter()
        .map(|tool| ToolDescriptor { name: tool.name().to_owned(), schema: tool.input_schema() })
        .collect()
}

fn error_payload(kind: &str, message: &str) -> Value {
    json!({ "error": kind, "message": message })
}

fn build_metadata(
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    approval_batches: u32,
    tools_invoked: Vec<String>,
    success_counts: HashMap<String, u32>,
    failure_counts: HashMap<String, u32>,
) -> TrajectoryMetadata {
    let duration = ended_at
        .signed_duration_since(started_at)
        .to_std()
        .map(DurationMs::from)
        .unwrap_or(DurationMs::ZERO);
    TrajectoryMetadata {
        started_at,
        ended_at,
        duration,
        approval_batches,
        tools_invoked,
        tool_success_counts: serde_json::to_value(success_counts).unwrap_or_else(|_| json!({})),
        tool_failure_counts: serde_json::to_value(failure_counts).unwrap_or_else(|_| json!({})),
    }
}

#[derive(Default)]
struct StreamAccumulator {
    messages: Vec<AgentMessage>,
    calls: Vec<ToolCall>,
    stop_reason: Option<StopReason>,
}

impl StreamAccumulator {
    fn call_mut(&mut self, id: layer0::ToolCallId) -> &mut ToolCall {
        if let Some(pos) = self.calls.iter().position(|c| c.tool_call_id == id) {
            &mut self.calls[pos]
        } else {
            self.calls.push(ToolCall::new(id));
            self.calls.last_mut().expect("just pushed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_provider::{ScriptedAgentRuntime, ScriptedDraftProvider, ScriptedImageProvider};
    use canvas_session::{CanvasSessionConfig, CanvasSessionManager};
    use canvas_state::MemoryDb;
    use canvas_tools::{experience_kind_registry, user_kind_registry, world_kind_registry};
    use layer0::ToolCallId;
    use std::pin::Pin;
    use std::future::Future;

    fn test_registries() -> KindRegistries {
        KindRegistries { user: user_kind_registry(), world: world_kind_registry(), experience: experience_kind_registry() }
    }

    fn build_orchestrator(runtime: ScriptedAgentRuntime, config: OrchestratorConfig) -> (Orchestrator, Arc<crate::trajectory::InMemoryTrajectorySink>, Arc<MemoryDb>) {
        let db: Arc<MemoryDb> = Arc::new(MemoryDb::new());
        let router = Arc::new(AgentRouter::new(Arc::clone(&db) as Arc<dyn Db>));
        let sink = Arc::new(crate::trajectory::InMemoryTrajectorySink::new());
        let canvas = Arc::new(CanvasSessionManager::new(CanvasSessionConfig::default()));
        let orch = Orchestrator::new(
            router,
            Arc::new(runtime),
            Arc::clone(&db) as Arc<dyn Db>,
            Arc::new(canvas_state::MemoryBlob::new()),
            vec![Arc::new(ScriptedImageProvider::available("gemini"))],
            Arc::new(ScriptedDraftProvider::available()),
            canvas,
            test_registries(),
            sink.clone(),
            config,
        );
        (orch, sink, db)
    }

    struct CountingTool {
        calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl canvas_tool::ToolDyn for CountingTool {
        fn name(&self) -> &str {
            "noop"
        }
        fn description(&self) -> &str {
            "test-only tool that always succeeds"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        fn call<'a>(
            &'a self,
            _args: Value,
            _ctx: &'a ToolContext,
        ) -> Pin<Box<dyn Future<Output = Result<Value, canvas_tool::ToolError>> + Send + 'a>> {
            let calls = self.calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(json!({"ok": true}))
            })
        }
    }

    #[tokio::test]
    async fn end_turn_with_no_tool_calls_returns_completed() {
        let runtime = ScriptedAgentRuntime::new(vec![vec![
            Ok(Chunk::AssistantText { text: "hello there".into() }),
            Ok(Chunk::StopReason { reason: "end_turn".into() }),
        ]]);
        let (orch, sink, _db) = build_orchestrator(runtime, OrchestratorConfig::default());
        let out = orch.send_message(&UserId::new("u1"), "hi", SendMessageContext::user()).await.unwrap();
        assert_eq!(out.execution_status, ExecutionStatus::Completed);
        assert_eq!(out.messages.len(), 1);
        assert!(out.tool_calls.is_empty());
        assert_eq!(sink.all().len(), 1);
        assert_eq!(sink.all()[0].execution_status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn tool_call_argument_parse_failure_skips_execution() {
        let tool_call_id = ToolCallId::new("tc1");
        let runtime = ScriptedAgentRuntime::new(vec![
            vec![
                Ok(Chunk::ApprovalRequestMessage { tool_call_id: tool_call_id.clone(), tool_name: Some("noop".into()), arguments_delta: "{not json".into() }),
                Ok(Chunk::StopReason { reason: "requires_approval".into() }),
            ],
            vec![Ok(Chunk::StopReason { reason: "end_turn".into() })],
        ]);
        let mut registries = test_registries();
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        registries.experience.register(std::sync::Arc::new(CountingTool { calls: calls.clone() }));
        let db: Arc<MemoryDb> = Arc::new(MemoryDb::new());
        let router = Arc::new(AgentRouter::new(Arc::clone(&db) as Arc<dyn Db>));
        let sink = Arc::new(crate::trajectory::InMemoryTrajectorySink::new());
        let canvas = Arc::new(CanvasSessionManager::new(CanvasSessionConfig::default()));
        let orch = Orchestrator::new(
            router,
            Arc::new(runtime),
            Arc::clone(&db) as Arc<dyn Db>,
            Arc::new(canvas_state::MemoryBlob::new()),
            vec![Arc::new(ScriptedImageProvider::available("gemini"))],
            Arc::new(ScriptedDraftProvider::available()),
            canvas,
            registries,
            sink,
            OrchestratorConfig::default(),
        );

        let out = orch.send_message(&UserId::new("u1"), "hi", SendMessageContext::experience()).await.unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0, "executor must not run on a parse failure");
        assert_eq!(out.tool_calls.len(), 1);
        assert!(!out.tool_calls[0].success);
        assert_eq!(out.tool_calls[0].error_kind.as_deref(), Some("ValidationError"));
    }

    #[tokio::test]
    async fn divergent_loop_stops_at_the_configured_cap() {
        let runtime = ScriptedAgentRuntime::repeating(vec![vec![
            Ok(Chunk::ApprovalRequestMessage { tool_call_id: ToolCallId::new("tc1"), tool_name: Some("noop".into()), arguments_delta: "{}".into() }),
            Ok(Chunk::StopReason { reason: "requires_approval".into() }),
        ]]);
        let mut registries = test_registries();
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        registries.experience.register(std::sync::Arc::new(CountingTool { calls: calls.clone() }));
        let db: Arc<MemoryDb> = Arc::new(MemoryDb::new());
        let router = Arc::new(AgentRouter::new(Arc::clone(&db) as Arc<dyn Db>));
        let sink = Arc::new(crate::trajectory::InMemoryTrajectorySink::new());
        let canvas = Arc::new(CanvasSessionManager::new(CanvasSessionConfig::default()));
        let mut config = OrchestratorConfig::default();
        config.max_approval_iterations = 3;
        let orch = Orchestrator::new(
            router,
            Arc::new(runtime),
            Arc::clone(&db) as Arc<dyn Db>,
            Arc::new(canvas_state::MemoryBlob::new()),
            vec![Arc::new(ScriptedImageProvider::available("gemini"))],
            Arc::new(ScriptedDraftProvider::available()),
            canvas,
            registries,
            sink.clone(),
            config,
        );

        let out = orch.send_message(&UserId::new("u1"), "hi", SendMessageContext::experience()).await.unwrap();
        assert_eq!(out.execution_status, ExecutionStatus::Incomplete);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
        assert_eq!(out.tool_calls.len(), 3);
        assert_eq!(sink.all()[0].execution_status, ExecutionStatus::Incomplete);
        assert_eq!(sink.all()[0].outcome, Some(Outcome::PartialSuccess));
    }

    #[tokio::test]
    async fn world_kind_turn_without_world_id_is_rejected() {
        let runtime = ScriptedAgentRuntime::new(vec![]);
        let (orch, _sink, _db) = build_orchestrator(runtime, OrchestratorConfig::default());
        let err = orch.send_message(&UserId::new("u1"), "hi", SendMessageContext { kind: AgentKind::World, world_id: None, story_id: None, cancellation: Arc::new(NeverCancelled) }).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[tokio::test]
    async fn stream_transport_failure_exhausts_retries_and_fails_the_turn() {
        let runtime = ScriptedAgentRuntime::new(vec![]);
        let mut config = OrchestratorConfig::default();
        config.max_stream_retries = 2;
        config.retry_backoff_base = DurationMs::from_millis(1);
        let (orch, sink, _db) = build_orchestrator(runtime, config);
        let err = orch.send_message(&UserId::new("u1"), "hi", SendMessageContext::user()).await.unwrap_err();
        assert_eq!(err.kind(), "AgentRuntimeUnavailable");
        assert_eq!(sink.all().len(), 1);
        assert_eq!(sink.all()[0].execution_status, ExecutionStatus::Failed);
    }

    #[tokio::test]
    async fn ordered_tool_calls_dispatch_in_requested_order() {
        let runtime = ScriptedAgentRuntime::new(vec![
            vec![
                Ok(Chunk::ApprovalRequestMessage { tool_call_id: ToolCallId::new("tc1"), tool_name: Some("send_suggestion".into()), arguments_delta: "{\"summary\":\"first\"}".into() }),
                Ok(Chunk::ApprovalRequestMessage { tool_call_id: ToolCallId::new("tc2"), tool_name: Some("send_suggestion".into()), arguments_delta: "{\"summary\":\"second\"}".into() }),
                Ok(Chunk::StopReason { reason: "requires_approval".into() }),
            ],
            vec![Ok(Chunk::StopReason { reason: "end_turn".into() })],
        ]);
        let (orch, _sink, _db) = build_orchestrator(runtime, OrchestratorConfig::default());
        let out = orch.send_message(&UserId::new("u1"), "hi", SendMessageContext::experience()).await.unwrap();
        let ids: Vec<_> = out.tool_calls.iter().map(|t| t.tool_call_id.as_str().to_owned()).collect();
        assert_eq!(ids, vec!["tc1".to_owned(), "tc2".to_owned()]);
    }

    #[tokio::test]
    async fn memory_reconciliation_failure_does_not_fail_the_turn() {
        // World-kind turn whose world row was never written: reconciliation's
        // `load_world` fails, but the turn itself still completes since the
        // router already proved agent creation succeeds independently.
        let runtime = ScriptedAgentRuntime::new(vec![]);
        let db: Arc<MemoryDb> = Arc::new(MemoryDb::new());
        let owner = UserId::new("owner");
        let world_id = WorldId::new("w1");
        let world = canvas_types::World::new(world_id.clone(), owner.clone(), json!({"title": "Aethel"}), Utc::now());
        db.write(&keys::world(&world_id), serde_json::to_value(&world).unwrap()).await.unwrap();
        let router = Arc::new(AgentRouter::new(Arc::clone(&db) as Arc<dyn Db>));
        // Pre-create the agent, then delete the world row so reconciliation's
        // own lookup fails on the next turn.
        router.get_or_create_world_agent(&owner, &world_id).await.unwrap();
        db.delete(&keys::world(&world_id)).await.unwrap();

        let sink = Arc::new(crate::trajectory::InMemoryTrajectorySink::new());
        let canvas = Arc::new(CanvasSessionManager::new(CanvasSessionConfig::default()));
        let runtime = ScriptedAgentRuntime::new(vec![vec![Ok(Chunk::StopReason { reason: "end_turn".into() })]]);
        let orch = Orchestrator::new(
            router,
            Arc::new(runtime),
            Arc::clone(&db) as Arc<dyn Db>,
            Arc::new(canvas_state::MemoryBlob::new()),
            vec![Arc::new(ScriptedImageProvider::available("gemini"))],
            Arc::new(ScriptedDraftProvider::available()),
            canvas,
            test_registries(),
            sink,
            OrchestratorConfig::default(),
        );

        let out = orch.send_message(&owner, "hi", SendMessageContext::world(world_id)).await.unwrap();
        assert_eq!(out.execution_status, ExecutionStatus::Completed);
    }
}
