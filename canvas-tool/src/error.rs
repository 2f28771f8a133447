//! Tool-local errors. Every tool call either returns a JSON success
//! payload or one of these kinds; the orchestrator catches them and
//! converts into [`layer0::CanvasError`] at the approval-result boundary
//! rather than letting a tool's failure shape leak further.

use layer0::CanvasError;
use thiserror::Error;

/// The closed set of error kinds a tool executor may return.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments failed schema validation, or a required field was
    /// empty/missing.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The calling user does not own the entity it is acting on.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// A dot-notation update path was malformed or targeted a
    /// disallowed key.
    #[error("invalid path: {0}")]
    PathInvalid(String),

    /// An external AI/image provider call failed.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A concurrent update collided with another in-flight write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Catch-all for anything that does not fit the above kinds.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// A short, stable name for the error kind, used in trajectory
    /// capture and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation(_) => "ValidationError",
            ToolError::NotFound(_) => "NotFound",
            ToolError::NotAuthorized(_) => "NotAuthorized",
            ToolError::PathInvalid(_) => "PathInvalid",
            ToolError::ProviderUnavailable(_) => "ProviderUnavailable",
            ToolError::Conflict(_) => "Conflict",
            ToolError::Internal(_) => "Internal",
        }
    }
}

/// Tool executors receive `CanvasError` from the `Db`/`Blob`/provider
/// capabilities they call; fold it into the tool-local taxonomy at that
/// boundary rather than threading two error types through every tool
/// body.
impl From<CanvasError> for ToolError {
    fn from(e: CanvasError) -> Self {
        match e {
            CanvasError::ValidationError(m) => ToolError::Validation(m),
            CanvasError::NotFound(m) => ToolError::NotFound(m),
            CanvasError::NotAuthorized(m) => ToolError::NotAuthorized(m),
            CanvasError::PathInvalid(m) => ToolError::PathInvalid(m),
            CanvasError::ProviderUnavailable(m) => ToolError::ProviderUnavailable(m),
            CanvasError::Conflict(m) => ToolError::Conflict(m),
            other => ToolError::Internal(other.to_string()),
        }
    }
}

/// The orchestrator's approval-result envelope carries this shape, not a
/// `ToolError` directly — this is the boundary conversion applied to
/// tool errors before they are surfaced back to the agent.
impl From<ToolError> for CanvasError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::Validation(m) => CanvasError::ValidationError(m),
            ToolError::NotFound(m) => CanvasError::NotFound(m),
            ToolError::NotAuthorized(m) => CanvasError::NotAuthorized(m),
            ToolError::PathInvalid(m) => CanvasError::PathInvalid(m),
            ToolError::ProviderUnavailable(m) => CanvasError::ProviderUnavailable(m),
            ToolError::Conflict(m) => CanvasError::Conflict(m),
            ToolError::Internal(m) => CanvasError::Internal(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_error_round_trips_through_tool_error() {
        let original = CanvasError::NotAuthorized("world w1".into());
        let tool_err: ToolError = original.into();
        assert_eq!(tool_err.kind(), "NotAuthorized");
        let back: CanvasError = tool_err.into();
        assert_eq!(back.kind(), "NotAuthorized");
    }
}
