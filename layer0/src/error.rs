//! The closed error taxonomy every component surface returns into.

use thiserror::Error;

/// The closed set of error kinds any surface in this workspace can
/// return. Component-local errors (tool validation, canvas transport,
/// provider failures) convert into this at the boundary rather than
/// leaking their own shape to callers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Bad arguments — malformed tool input, failed JSON parse, schema
    /// mismatch, or an empty required field.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A referenced entity (world, story, segment, asset, agent) does
    /// not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller does not own the entity it is trying to act on.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// A dot-notation update path was malformed or targeted a
    /// disallowed key.
    #[error("invalid path: {0}")]
    PathInvalid(String),

    /// An external AI/image provider call failed.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The agent runtime stream/transport failed past its retry
    /// budget.
    #[error("agent runtime unavailable: {0}")]
    AgentRuntimeUnavailable(String),

    /// The approval loop exceeded its iteration cap without reaching a
    /// terminal stop reason.
    #[error("turn diverged: {0}")]
    TurnDiverged(String),

    /// A concurrent update collided with another in-flight write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Catch-all for anything that does not fit the above kinds.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wraps an arbitrary lower-level error as an `Internal` failure
    /// while preserving its source for diagnostics.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CanvasError {
    /// A short, stable name for the error kind, used in trajectory
    /// capture and logging where the full `Display` message is too
    /// verbose.
    pub fn kind(&self) -> &'static str {
        match self {
            CanvasError::ValidationError(_) => "ValidationError",
            CanvasError::NotFound(_) => "NotFound",
            CanvasError::NotAuthorized(_) => "NotAuthorized",
            CanvasError::PathInvalid(_) => "PathInvalid",
            CanvasError::ProviderUnavailable(_) => "ProviderUnavailable",
            CanvasError::AgentRuntimeUnavailable(_) => "AgentRuntimeUnavailable",
            CanvasError::TurnDiverged(_) => "TurnDiverged",
            CanvasError::Conflict(_) => "Conflict",
            CanvasError::Internal(_) => "Internal",
            CanvasError::Other(_) => "Internal",
        }
    }
}
