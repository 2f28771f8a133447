//! `CanvasConfig`: every timeout/cap/depth knob the composition root
//! resolves before constructing an [`crate::CanvasApp`], with defaults
//! overridable from the process environment.

use std::collections::HashMap;

use canvas_orch::OrchestratorConfig;
use canvas_session::CanvasSessionConfig;
use layer0::DurationMs;

const DEFAULT_PERSONA: &str = "You are a collaborative world-building and story-writing assistant.";

/// Resolved configuration for one running [`crate::CanvasApp`]. Built
/// via [`CanvasConfig::default`] or [`CanvasConfig::from_env`]; either
/// way the result is a plain struct a caller can also construct (or
/// override fields on) directly, no builder required.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Idle timeout for a single agent-runtime stream read.
    pub idle_stream_timeout: DurationMs,
    /// Per-tool-call timeout, used for any tool without its own entry
    /// in `tool_timeouts`.
    pub default_tool_timeout: DurationMs,
    /// Timeout for the `image_generator` tool specifically, which runs
    /// noticeably longer than a plain state mutation.
    pub image_tool_timeout: DurationMs,
    /// Approval batches allowed before a turn is declared diverged.
    pub max_approval_iterations: u32,
    /// Bounded retry attempts for a failing agent-runtime stream.
    pub max_stream_retries: u32,
    /// Base delay for the exponential backoff between stream retries.
    pub retry_backoff_base: DurationMs,
    /// Whether a trajectory record is written at all.
    pub trajectory_capture_enabled: bool,
    /// Maximum undelivered outbound canvas envelopes kept per user.
    pub canvas_outbound_backlog_depth: usize,
    /// Maximum queued inbound interactions kept per user.
    pub canvas_inbound_backlog_depth: usize,
    /// How long an idle, subscriber-less canvas session survives
    /// before it becomes GC-eligible.
    pub canvas_idle_gc_threshold: DurationMs,
    /// Persona text folded into the `persona` memory block for
    /// User-kind agents.
    pub persona: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        let canvas_defaults = CanvasSessionConfig::default();
        Self {
            idle_stream_timeout: defaults.idle_stream_timeout,
            default_tool_timeout: defaults.default_tool_timeout,
            image_tool_timeout: defaults
                .tool_timeouts
                .get("image_generator")
                .copied()
                .unwrap_or(DurationMs::from_secs(180)),
            max_approval_iterations: defaults.max_approval_iterations,
            max_stream_retries: defaults.max_stream_retries,
            retry_backoff_base: defaults.retry_backoff_base,
            trajectory_capture_enabled: defaults.trajectory_capture_enabled,
            canvas_outbound_backlog_depth: canvas_defaults.outbound_backlog_depth,
            canvas_inbound_backlog_depth: canvas_defaults.inbound_backlog_depth,
            canvas_idle_gc_threshold: canvas_defaults.idle_gc_threshold,
            persona: DEFAULT_PERSONA.to_owned(),
        }
    }
}

impl CanvasConfig {
    /// Start from [`CanvasConfig::default`] and apply any recognized
    /// `CANVAS_*` environment variable overrides. An unset or
    /// unparseable variable leaves the default in place rather than
    /// failing the whole load.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_millis("CANVAS_IDLE_STREAM_TIMEOUT_MS") {
            config.idle_stream_timeout = v;
        }
        if let Some(v) = env_millis("CANVAS_DEFAULT_TOOL_TIMEOUT_MS") {
            config.default_tool_timeout = v;
        }
        if let Some(v) = env_millis("CANVAS_IMAGE_TOOL_TIMEOUT_MS") {
            config.image_tool_timeout = v;
        }
        if let Some(v) = env_u32("CANVAS_MAX_APPROVAL_ITERATIONS") {
            config.max_approval_iterations = v;
        }
        if let Some(v) = env_u32("CANVAS_MAX_STREAM_RETRIES") {
            config.max_stream_retries = v;
        }
        if let Some(v) = env_millis("CANVAS_RETRY_BACKOFF_BASE_MS") {
            config.retry_backoff_base = v;
        }
        if let Some(v) = env_bool("CANVAS_TRAJECTORY_CAPTURE_ENABLED") {
            config.trajectory_capture_enabled = v;
        }
        if let Some(v) = env_usize("CANVAS_OUTBOUND_BACKLOG_DEPTH") {
            config.canvas_outbound_backlog_depth = v;
        }
        if let Some(v) = env_usize("CANVAS_INBOUND_BACKLOG_DEPTH") {
            config.canvas_inbound_backlog_depth = v;
        }
        if let Some(v) = env_millis("CANVAS_IDLE_GC_THRESHOLD_MS") {
            config.canvas_idle_gc_threshold = v;
        }
        if let Ok(persona) = std::env::var("CANVAS_PERSONA") {
            if !persona.trim().is_empty() {
                config.persona = persona;
            }
        }

        config
    }

    /// Project onto the `canvas-orch` orchestrator's own config shape.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut tool_timeouts = HashMap::new();
        tool_timeouts.insert("image_generator".to_owned(), self.image_tool_timeout);
        OrchestratorConfig {
            max_approval_iterations: self.max_approval_iterations,
            idle_stream_timeout: self.idle_stream_timeout,
            default_tool_timeout: self.default_tool_timeout,
            tool_timeouts,
            max_stream_retries: self.max_stream_retries,
            retry_backoff_base: self.retry_backoff_base,
            trajectory_capture_enabled: self.trajectory_capture_enabled,
        }
    }

    /// Project onto the `canvas-session` manager's own config shape.
    pub fn canvas_session_config(&self) -> CanvasSessionConfig {
        CanvasSessionConfig {
            outbound_backlog_depth: self.canvas_outbound_backlog_depth,
            inbound_backlog_depth: self.canvas_inbound_backlog_depth,
            idle_gc_threshold: self.canvas_idle_gc_threshold,
        }
    }
}

fn env_millis(name: &str) -> Option<DurationMs> {
    env_u64(name).map(DurationMs::from_millis)
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_orchestrator_and_session_defaults() {
        let config = CanvasConfig::default();
        assert_eq!(config.max_approval_iterations, 16);
        assert_eq!(config.canvas_outbound_backlog_depth, 256);
        assert_eq!(config.persona, DEFAULT_PERSONA);
    }

    #[test]
    fn from_env_overrides_only_recognized_and_parseable_vars() {
        std::env::set_var("CANVAS_MAX_APPROVAL_ITERATIONS", "9");
        std::env::set_var("CANVAS_OUTBOUND_BACKLOG_DEPTH", "not-a-number");
        let config = CanvasConfig::from_env();
        assert_eq!(config.max_approval_iterations, 9);
        assert_eq!(config.canvas_outbound_backlog_depth, 256);
        std::env::remove_var("CANVAS_MAX_APPROVAL_ITERATIONS");
        std::env::remove_var("CANVAS_OUTBOUND_BACKLOG_DEPTH");
    }

    #[test]
    fn orchestrator_config_projection_carries_image_timeout() {
        let mut config = CanvasConfig::default();
        config.image_tool_timeout = DurationMs::from_secs(42);
        let oc = config.orchestrator_config();
        assert_eq!(oc.tool_timeouts.get("image_generator").copied(), Some(DurationMs::from_secs(42)));
    }
}
