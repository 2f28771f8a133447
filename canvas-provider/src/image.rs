//! The `ImageProvider` capability invoked by the `image_generator` tool.

use async_trait::async_trait;
use layer0::CanvasError;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Bytes and metadata returned by a successful generation call.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime: String,
}

/// A single image-generation backend (`"gemini"`, `"openai"`, ...). The
/// `image_generator` tool picks a provider by explicit argument, falling
/// back through a configured availability order.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// This provider's name, as referenced by `image_generator`'s
    /// `provider` argument.
    fn name(&self) -> &str;

    /// Generate an image for `prompt`. `size` and `mime` are hints; a
    /// provider may ignore `size` or substitute its own supported MIME
    /// type, returning the one actually used in [`GeneratedImage::mime`].
    async fn generate(
        &self,
        prompt: &str,
        size: Option<&str>,
        mime: Option<&str>,
    ) -> Result<GeneratedImage, CanvasError>;
}

/// A deterministic, in-memory image provider for tests: produces a small
/// fixed byte payload rather than calling out to a real model, and can be
/// scripted to fail a fixed number of times before succeeding (or always
/// fail) to exercise `ProviderUnavailable` / fallback-order handling.
pub struct ScriptedImageProvider {
    name: String,
    /// Queue of canned outcomes consumed in order; once empty, the
    /// provider always succeeds with a placeholder payload.
    outcomes: Mutex<VecDeque<Result<(), String>>>,
}

impl ScriptedImageProvider {
    /// A provider that always succeeds.
    pub fn available(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: Mutex::new(VecDeque::new()),
        }
    }

    /// A provider that always fails with `reason`.
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut outcomes = VecDeque::new();
        outcomes.push_back(Err(reason.into()));
        Self {
            name: name.into(),
            outcomes: Mutex::new(outcomes),
        }
    }
}

#[async_trait]
impl ImageProvider for ScriptedImageProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        _size: Option<&str>,
        mime: Option<&str>,
    ) -> Result<GeneratedImage, CanvasError> {
        let outcome = {
            let mut outcomes = self
                .outcomes
                .lock()
                .map_err(|_| CanvasError::Internal("provider lock poisoned".into()))?;
            if outcomes.len() > 1 {
                outcomes.pop_front()
            } else {
                outcomes.front().cloned()
            }
        };
        if let Some(Err(reason)) = outcome {
            return Err(CanvasError::ProviderUnavailable(reason));
        }
        Ok(GeneratedImage {
            bytes: format!("generated:{prompt}").into_bytes(),
            mime: mime.unwrap_or("image/png").to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn available_provider_succeeds() {
        let provider = ScriptedImageProvider::available("gemini");
        let img = provider.generate("a brass sextant", None, None).await.unwrap();
        assert_eq!(img.mime, "image/png");
        assert!(!img.bytes.is_empty());
    }

    #[tokio::test]
    async fn unavailable_provider_fails() {
        let provider = ScriptedImageProvider::unavailable("openai", "quota exceeded");
        let err = provider.generate("x", None, None).await.unwrap_err();
        assert!(matches!(err, CanvasError::ProviderUnavailable(_)));
    }
}
