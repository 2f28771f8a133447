//! `get_canvas_interactions`: dequeues inbound interaction events.
//! Experience-kind tool.

use std::future::Future;
use std::pin::Pin;

use canvas_tool::{ToolContext, ToolDyn, ToolError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

/// Default max interactions returned when the caller omits `max`.
const DEFAULT_MAX: usize = 50;

/// Drains up to `max` queued interactions for the caller, oldest first.
pub struct GetCanvasInteractions;

#[derive(Deserialize)]
struct Args {
    since: Option<DateTime<Utc>>,
    max: Option<usize>,
}

impl ToolDyn for GetCanvasInteractions {
    fn name(&self) -> &str {
        "get_canvas_interactions"
    }

    fn description(&self) -> &str {
        "Dequeue pending browser interaction events, in FIFO order"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "since": {"type": "string", "format": "date-time"},
                "max": {"type": "integer"},
            },
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
            let max = args.max.unwrap_or(DEFAULT_MAX);
            let interactions = ctx.canvas.drain(&ctx.user_id, max, args.since).await?;
            Ok(json!({ "interactions": interactions }))
        })
    }
}
