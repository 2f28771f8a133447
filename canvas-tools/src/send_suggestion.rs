//! `send_suggestion`: enqueues a lightweight suggestion envelope,
//! delivered over the same transport as canvas ops but kept distinct
//! from the component tree. Experience-kind tool.

use std::future::Future;
use std::pin::Pin;

use canvas_tool::{ToolContext, ToolDyn, ToolError};
use canvas_types::Suggestion;
use serde::Deserialize;
use serde_json::{json, Value};

/// Publishes a single suggestion to the caller's outbound queue.
pub struct SendSuggestion;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    title: String,
    body: String,
    action_id: Option<String>,
}

impl ToolDyn for SendSuggestion {
    fn name(&self) -> &str {
        "send_suggestion"
    }

    fn description(&self) -> &str {
        "Send a lightweight suggestion to the browser"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "body": {"type": "string"},
                "actionId": {"type": "string"},
            },
            "required": ["title", "body"],
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
            if args.title.trim().is_empty() {
                return Err(ToolError::Validation("title must not be empty".into()));
            }

            let suggestion = Suggestion { title: args.title, body: args.body, action_id: args.action_id };
            ctx.canvas.publish_suggestion(&ctx.user_id, suggestion).await?;
            Ok(json!({ "enqueued": true }))
        })
    }
}
