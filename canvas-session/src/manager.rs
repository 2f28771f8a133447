//! `CanvasSessionManager`: the per-user multiplexer between tools and
//! the browser transport. One session per `userId`, created lazily on
//! first `publish`/`ingest`/`subscribe`; the per-user state is guarded
//! by its own `tokio::sync::Mutex` so different users never contend.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::sync::{Arc, atomic::AtomicU64, atomic::Ordering};

use async_trait::async_trait;
use canvas_tool::CanvasHandle;
use canvas_types::{CanvasOp, Interaction, OutboundEnvelope, Suggestion};
use chrono::{DateTime, Utc};
use layer0::{CanvasError, DurationMs, UserId};
use tokio::sync::Mutex as AsyncMutex;

use crate::sink::{CanvasSink, SubscriptionId};

/// Queue-depth and GC-threshold knobs.
#[derive(Debug, Clone, Copy)]
pub struct CanvasSessionConfig {
    /// Maximum undelivered outbound envelopes kept per user before the
    /// oldest is dropped.
    pub outbound_backlog_depth: usize,
    /// Maximum queued inbound interactions kept per user before the
    /// oldest is dropped.
    pub inbound_backlog_depth: usize,
    /// How long a subscriber-less, empty-queued session survives before
    /// it becomes GC-eligible.
    pub idle_gc_threshold: DurationMs,
}

impl Default for CanvasSessionConfig {
    fn default() -> Self {
        Self {
            outbound_backlog_depth: 256,
            inbound_backlog_depth: 256,
            idle_gc_threshold: DurationMs::from_secs(30 * 60),
        }
    }
}

struct SessionState {
    outbound: VecDeque<OutboundEnvelope>,
    inbound: VecDeque<Interaction>,
    subscribers: Vec<(SubscriptionId, Arc<dyn CanvasSink>)>,
    last_activity_at: DateTime<Utc>,
}

impl SessionState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            outbound: VecDeque::new(),
            inbound: VecDeque::new(),
            subscribers: Vec::new(),
            last_activity_at: now,
        }
    }

    fn is_idle(&self) -> bool {
        self.subscribers.is_empty() && self.outbound.is_empty() && self.inbound.is_empty()
    }
}

/// The per-user canvas multiplexer. Cheap to clone (an `Arc` inside),
/// shared across the orchestrator, the `canvas_ui`/`get_canvas_interactions`
/// tools, and the transport layer's subscription point.
pub struct CanvasSessionManager {
    config: CanvasSessionConfig,
    sessions: RwLock<HashMap<String, Arc<AsyncMutex<SessionState>>>>,
    next_subscription_id: AtomicU64,
}

impl CanvasSessionManager {
    /// Build a manager with the given queue-depth/GC configuration.
    pub fn new(config: CanvasSessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            next_subscription_id: AtomicU64::new(1),
        }
    }

    fn session_for(&self, user_id: &UserId, now: DateTime<Utc>) -> Arc<AsyncMutex<SessionState>> {
        if let Some(session) = self.sessions.read().unwrap().get(user_id.as_str()) {
            return Arc::clone(session);
        }
        let mut sessions = self.sessions.write().unwrap();
        Arc::clone(
            sessions
                .entry(user_id.as_str().to_owned())
                .or_insert_with(|| Arc::new(AsyncMutex::new(SessionState::new(now)))),
        )
    }

    async fn publish_envelope(
        &self,
        user_id: &UserId,
        envelope: OutboundEnvelope,
    ) -> Result<(), CanvasError> {
        let now = Utc::now();
        let session = self.session_for(user_id, now);
        let mut state = session.lock().await;
        state.last_activity_at = now;

        if state.subscribers.is_empty() {
            if state.outbound.len() >= self.config.outbound_backlog_depth {
                state.outbound.pop_front();
                tracing::warn!(user_id = user_id.as_str(), "dropped oldest queued canvas op: backlog full");
            }
            state.outbound.push_back(envelope);
        } else {
            for (_, sink) in &state.subscribers {
                sink.deliver(envelope.clone());
            }
        }
        Ok(())
    }

    /// Register a subscriber for `user_id`. Any envelopes queued while
    /// no subscriber was present are flushed to it, in order, before any
    /// new envelope is delivered.
    pub async fn subscribe(&self, user_id: &UserId, sink: Arc<dyn CanvasSink>) -> SubscriptionId {
        let now = Utc::now();
        let session = self.session_for(user_id, now);
        let mut state = session.lock().await;
        state.last_activity_at = now;

        for envelope in state.outbound.drain(..) {
            sink.deliver(envelope);
        }

        let id = SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::Relaxed));
        state.subscribers.push((id, sink));
        id
    }

    /// Remove a subscriber registered via [`CanvasSessionManager::subscribe`].
    pub async fn unsubscribe(&self, user_id: &UserId, id: SubscriptionId) {
        let now = Utc::now();
        let session = self.session_for(user_id, now);
        let mut state = session.lock().await;
        state.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    /// Append an inbound interaction from the browser transport.
    pub async fn ingest(&self, user_id: &UserId, interaction: Interaction) -> Result<(), CanvasError> {
        let now = Utc::now();
        let session = self.session_for(user_id, now);
        let mut state = session.lock().await;
        state.last_activity_at = now;

        if state.inbound.len() >= self.config.inbound_backlog_depth {
            state.inbound.pop_front();
            tracing::warn!(user_id = user_id.as_str(), "dropped oldest inbound interaction: backlog full");
        }
        state.inbound.push_back(interaction);
        Ok(())
    }

    /// Sweep every tracked session and drop the ones eligible for GC:
    /// no subscribers, both queues empty, idle past the configured
    /// threshold relative to `now`.
    pub fn gc_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap();
        let threshold = self.config.idle_gc_threshold.to_std();
        let before = sessions.len();
        sessions.retain(|_, session| {
            // try_lock: a session mid-operation is by definition not idle.
            match session.try_lock() {
                Ok(state) => {
                    let age = now.signed_duration_since(state.last_activity_at);
                    !(state.is_idle() && age.to_std().map(|a| a >= threshold).unwrap_or(false))
                }
                Err(_) => true,
            }
        });
        before - sessions.len()
    }

    /// Convenience over [`CanvasSessionManager::gc_at`] using the system
    /// clock.
    pub fn gc(&self) -> usize {
        self.gc_at(Utc::now())
    }

    /// Number of sessions currently tracked (idle or not). Exposed for
    /// tests and observability.
    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }
}

#[async_trait]
impl CanvasHandle for CanvasSessionManager {
    async fn publish(&self, user_id: &UserId, op: CanvasOp) -> Result<(), CanvasError> {
        self.publish_envelope(user_id, OutboundEnvelope::Op(op)).await
    }

    async fn publish_suggestion(
        &self,
        user_id: &UserId,
        suggestion: Suggestion,
    ) -> Result<(), CanvasError> {
        self.publish_envelope(user_id, OutboundEnvelope::Suggestion(suggestion)).await
    }

    async fn drain(
        &self,
        user_id: &UserId,
        max: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Interaction>, CanvasError> {
        let now = Utc::now();
        let session = self.session_for(user_id, now);
        let mut state = session.lock().await;
        state.last_activity_at = now;

        let skip = match since {
            Some(since) => state.inbound.iter().take_while(|i| i.received_at < since).count(),
            None => 0,
        };
        let take = max.min(state.inbound.len() - skip);
        let drained = state.inbound.drain(skip..skip + take).collect();
        Ok(drained)
    }
}
