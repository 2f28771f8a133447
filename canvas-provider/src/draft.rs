//! The text/LLM capability behind `world_draft_generator`: proposes a
//! handful of candidate world concepts from a free-text prompt. Kept
//! distinct from [`crate::image::ImageProvider`] since it produces
//! structured text rather than image bytes, but follows the same
//! narrow-capability shape.

use async_trait::async_trait;
use layer0::CanvasError;
use serde::{Deserialize, Serialize};

/// One candidate world concept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldDraft {
    /// A short working title.
    pub title: String,
    /// A one- or two-sentence premise.
    pub premise: String,
    /// The creative pillars the draft is built around.
    pub pillars: Vec<String>,
}

/// Proposes world-concept drafts from a prompt. `world_draft_generator`
/// is the only tool that calls this capability.
#[async_trait]
pub trait DraftProvider: Send + Sync {
    /// Propose 3-4 candidate world concepts for `prompt`.
    async fn propose_drafts(&self, prompt: &str) -> Result<Vec<WorldDraft>, CanvasError>;
}

/// A deterministic draft provider for tests: derives drafts from the
/// prompt text itself rather than calling a model. Can be scripted to
/// fail, to exercise `ProviderUnavailable` handling in
/// `world_draft_generator`.
pub struct ScriptedDraftProvider {
    fail_with: Option<String>,
}

impl ScriptedDraftProvider {
    /// A provider that always succeeds with deterministic drafts.
    pub fn available() -> Self {
        Self { fail_with: None }
    }

    /// A provider that always fails with `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self { fail_with: Some(reason.into()) }
    }
}

#[async_trait]
impl DraftProvider for ScriptedDraftProvider {
    async fn propose_drafts(&self, prompt: &str) -> Result<Vec<WorldDraft>, CanvasError> {
        if let Some(reason) = &self.fail_with {
            return Err(CanvasError::ProviderUnavailable(reason.clone()));
        }
        Ok((1..=3)
            .map(|n| WorldDraft {
                title: format!("{prompt} — Concept {n}"),
                premise: format!("A world shaped by: {prompt} (variant {n})"),
                pillars: vec![format!("pillar-{n}-a"), format!("pillar-{n}-b")],
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn available_provider_returns_multiple_drafts() {
        let provider = ScriptedDraftProvider::available();
        let drafts = provider.propose_drafts("neon-noir archivists").await.unwrap();
        assert!(drafts.len() >= 3);
    }

    #[tokio::test]
    async fn unavailable_provider_errors() {
        let provider = ScriptedDraftProvider::unavailable("model overloaded");
        let err = provider.propose_drafts("x").await.unwrap_err();
        assert!(matches!(err, CanvasError::ProviderUnavailable(_)));
    }
}
