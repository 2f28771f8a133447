//! The object-safe tool contract and the dispatch table the
//! orchestrator looks tools up in by name.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::context::ToolContext;
use crate::error::ToolError;

/// A uniform, object-safe tool: `(args, ToolContext) -> ToolResult`.
/// Every concrete tool in `canvas-tools` implements this. Validation
/// against the tool's own declared schema happens inside `call` before
/// any side-effecting work — a schema mismatch returns
/// `ToolError::Validation` without touching `Db`/`Blob`/providers.
pub trait ToolDyn: Send + Sync {
    /// The tool's unique name, as referenced in `approval_request_message`
    /// chunks and in the `client_tools` descriptor list.
    fn name(&self) -> &str;

    /// Human-readable description, surfaced to the agent runtime.
    fn description(&self) -> &str;

    /// JSON Schema for this tool's input parameters.
    fn input_schema(&self) -> Value;

    /// Execute the tool against already-parsed arguments.
    fn call<'a>(
        &'a self,
        args: Value,
        ctx: &'a ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>>;
}

/// A closed, kind-scoped dispatch table of tools, keyed by name. An
/// agent must never reach a tool outside its own kind, so this
/// registry holds exactly the tools permitted for one agent kind; the
/// orchestrator builds a separate registry (or view) per kind rather
/// than filtering a single global one at dispatch time, so an
/// unregistered name can never be reached by construction.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, overwriting any existing tool with the same
    /// name.
    pub fn register(&mut self, tool: Arc<dyn ToolDyn>) {
        self.tools.insert(tool.name().to_owned(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolDyn>> {
        self.tools.get(name)
    }

    /// Iterate over every registered tool.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ToolDyn>> {
        self.tools.values()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry has no tools registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasHandle;
    use async_trait::async_trait;
    use canvas_provider::{GeneratedImage, ImageProvider, ScriptedDraftProvider};
    use canvas_state::{MemoryBlob, MemoryDb};
    use canvas_types::{CanvasOp, Interaction, Suggestion};
    use layer0::{CanvasError, UserId};
    use serde_json::json;

    struct NoopCanvas;
    #[async_trait]
    impl CanvasHandle for NoopCanvas {
        async fn publish(&self, _user_id: &UserId, _op: CanvasOp) -> Result<(), CanvasError> {
            Ok(())
        }
        async fn publish_suggestion(
            &self,
            _user_id: &UserId,
            _suggestion: Suggestion,
        ) -> Result<(), CanvasError> {
            Ok(())
        }
        async fn drain(
            &self,
            _user_id: &UserId,
            _max: usize,
            _since: Option<chrono::DateTime<chrono::Utc>>,
        ) -> Result<Vec<Interaction>, CanvasError> {
            Ok(vec![])
        }
    }

    struct NoopImage;
    #[async_trait]
    impl ImageProvider for NoopImage {
        fn name(&self) -> &str {
            "noop"
        }
        async fn generate(
            &self,
            _prompt: &str,
            _size: Option<&str>,
            _mime: Option<&str>,
        ) -> Result<GeneratedImage, CanvasError> {
            Ok(GeneratedImage { bytes: vec![], mime: "image/png".into() })
        }
    }

    fn test_context() -> ToolContext {
        ToolContext::new(
            UserId::new("u1"),
            Arc::new(MemoryDb::new()),
            Arc::new(MemoryBlob::new()),
            vec![Arc::new(NoopImage)],
            Arc::new(ScriptedDraftProvider::available()),
            Arc::new(NoopCanvas),
            chrono::Utc::now(),
        )
    }

    struct EchoTool;
    impl ToolDyn for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes input back"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        fn call<'a>(
            &'a self,
            args: Value,
            _ctx: &'a ToolContext,
        ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>> {
            Box::pin(async move { Ok(json!({"echoed": args})) })
        }
    }

    #[test]
    fn registry_register_and_get() {
        let mut reg = ToolRegistry::new();
        assert!(reg.is_empty());
        reg.register(Arc::new(EchoTool));
        assert_eq!(reg.len(), 1);
        assert!(reg.get("echo").is_some());
        assert!(reg.get("nope").is_none());
    }

    #[tokio::test]
    async fn registry_dispatch_calls_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        let ctx = test_context();
        let tool = reg.get("echo").unwrap();
        let out = tool.call(json!({"x": 1}), &ctx).await.unwrap();
        assert_eq!(out, json!({"echoed": {"x": 1}}));
    }

    #[test]
    fn registry_overwrite_keeps_single_entry() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        reg.register(Arc::new(EchoTool));
        assert_eq!(reg.len(), 1);
    }
}
