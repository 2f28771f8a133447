//! `canvas_ui`: enqueues a component-tree mutation onto the caller's
//! canvas session. Experience-kind tool.

use std::future::Future;
use std::pin::Pin;

use canvas_tool::{ToolContext, ToolDyn, ToolError};
use canvas_types::{CanvasOp, ComponentNode};
use layer0::ComponentId;
use serde::Deserialize;
use serde_json::{json, Value};

/// Publishes a single `CanvasOp` to the caller's outbound queue.
pub struct CanvasUi;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    operation: String,
    component_id: String,
    definition: Option<Value>,
}

impl ToolDyn for CanvasUi {
    fn name(&self) -> &str {
        "canvas_ui"
    }

    fn description(&self) -> &str {
        "Enqueue a render/update/remove/layout operation for a canvas component"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {"type": "string", "enum": ["render", "update", "remove", "layout"]},
                "componentId": {"type": "string"},
                "definition": {},
            },
            "required": ["operation", "componentId"],
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
            let component_id = ComponentId::new(args.component_id);

            let op = match args.operation.as_str() {
                "render" | "update" => {
                    let definition: ComponentNode = args
                        .definition
                        .ok_or_else(|| ToolError::Validation(format!("{} requires definition", args.operation)))
                        .and_then(|d| {
                            serde_json::from_value(d).map_err(|e| ToolError::Validation(e.to_string()))
                        })?;
                    if args.operation == "render" {
                        CanvasOp::Render { component_id, definition }
                    } else {
                        CanvasOp::Update { component_id, definition }
                    }
                }
                "remove" => CanvasOp::Remove { component_id },
                "layout" => CanvasOp::Layout { component_id, definition: args.definition },
                other => return Err(ToolError::Validation(format!("unknown operation: {other}"))),
            };

            ctx.canvas.publish(&ctx.user_id, op).await?;
            Ok(json!({ "enqueued": true }))
        })
    }
}
