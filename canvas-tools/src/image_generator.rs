//! `image_generator`: invokes an image-generation backend, stores the
//! result as a blob, and records an `Asset` row. Experience-kind tool.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use canvas_provider::ImageProvider;
use canvas_tool::{ToolContext, ToolDyn, ToolError};
use canvas_types::Asset;
use layer0::AssetId;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::keys;

/// Generates an image and persists it as an owned asset.
pub struct ImageGenerator;

#[derive(Deserialize)]
struct Args {
    prompt: String,
    provider: Option<String>,
    size: Option<String>,
    mime: Option<String>,
}

impl ToolDyn for ImageGenerator {
    fn name(&self) -> &str {
        "image_generator"
    }

    fn description(&self) -> &str {
        "Generate an image and store it as a new owned asset"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {"type": "string"},
                "provider": {"type": "string"},
                "size": {"type": "string"},
                "mime": {"type": "string"},
            },
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

            let candidates = candidate_providers(&ctx.image_providers, args.provider.as_deref())?;
            let generated = generate_with_fallback(candidates, &args).await?;

            let blob_key = ctx.blob.put(generated.bytes.clone()).await?;
            let asset = Asset {
                asset_id: AssetId::new(Uuid::new_v4().to_string()),
                owner_user_id: ctx.user_id.clone(),
                mime: generated.mime,
                size: generated.bytes.len() as u64,
                blob_key,
                created_at: ctx.now,
            };
            ctx.db
                .write(&keys::asset(&asset.asset_id), serde_json::to_value(&asset).unwrap())
                .await?;
            Ok(json!({ "assetId": asset.asset_id }))
        })
    }
}

/// The ordered slice of providers to attempt. An explicit `requested`
/// name narrows the candidate list to exactly that provider; otherwise
/// every configured provider is a candidate, in fallback-priority order.
fn candidate_providers<'a>(
    providers: &'a [Arc<dyn ImageProvider>],
    requested: Option<&str>,
) -> Result<Vec<&'a Arc<dyn ImageProvider>>, ToolError> {
    if let Some(name) = requested {
        let found: Vec<_> = providers.iter().filter(|p| p.name() == name).collect();
        if found.is_empty() {
            return Err(ToolError::ProviderUnavailable(format!("no provider named {name}")));
        }
        return Ok(found);
    }
    if providers.is_empty() {
        return Err(ToolError::ProviderUnavailable("no image providers configured".into()));
    }
    Ok(providers.iter().collect())
}

/// Try each candidate in order, returning the first success. If every
/// candidate fails, the last candidate's error is returned.
async fn generate_with_fallback(
    candidates: Vec<&Arc<dyn ImageProvider>>,
    args: &Args,
) -> Result<canvas_provider::GeneratedImage, ToolError> {
    let mut last_err = None;
    for provider in candidates {
        match provider.generate(&args.prompt, args.size.as_deref(), args.mime.as_deref()).await {
            Ok(generated) => return Ok(generated),
            Err(e) => last_err = Some(ToolError::from(e)),
        }
    }
    Err(last_err.unwrap_or_else(|| ToolError::ProviderUnavailable("no image providers configured".into())))
}
