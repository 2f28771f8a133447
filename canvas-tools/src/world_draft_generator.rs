//! `world_draft_generator`: proposes candidate world concepts from a
//! free-text prompt. User-kind tool.

use std::future::Future;
use std::pin::Pin;

use canvas_tool::{ToolContext, ToolDyn, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};

/// Proposes 3-4 candidate world concepts via the draft provider.
pub struct WorldDraftGenerator;

#[derive(Deserialize)]
struct Args {
    prompt: String,
}

impl ToolDyn for WorldDraftGenerator {
    fn name(&self) -> &str {
        "world_draft_generator"
    }

    fn description(&self) -> &str {
        "Propose candidate world concepts from a free-text prompt"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "prompt": { "type": "string" } },
            "required": ["prompt"],
        })
    }

    fn call<'a>(
        &'a self,
        args: Value,
        ctx: &'a ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>> {
        Box::pin(async move {
            let args: Args =
                serde_json::from_value(args).map_err(|e| ToolError::Validation(e.to_string()))?;
            if args.prompt.trim().is_empty() {
                return Err(ToolError::Validation("prompt must not be empty".into()));
            }
            let drafts = ctx.draft_provider.propose_drafts(&args.prompt).await?;
            Ok(json!({ "drafts": drafts }))
        })
    }
}
