//! `asset_manager`: retrieval URL and deletion for owned assets.
//! Experience-kind tool.

use std::future::Future;
use std::pin::Pin;

use canvas_tool::{ToolContext, ToolDyn, ToolError};
use canvas_types::Asset;
use layer0::AssetId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::keys;

/// Resolves a retrieval URL for, or deletes, an owned asset.
pub struct AssetManager;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    operation: String,
    asset_id: String,
}

impl ToolDyn for AssetManager {
    fn name(&self) -> &str {
        "asset_manager"
    }

    fn description(&self) -> &str {
        "Get a retrieval URL for, or delete, an owned asset"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {"type": "string", "enum": ["get_url", "delete"]},
                "assetId": {"type": "string"},
            },
            "required": ["operation", "assetId"],
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
            let asset_id = AssetId::new(args.asset_id);
            let key = keys::asset(&asset_id);

            let raw = ctx
                .db
                .read(&key)
                .await?
                .ok_or_else(|| ToolError::NotFound(format!("asset {asset_id}")))?;
            let asset: Asset =
                serde_json::from_value(raw).map_err(|e| ToolError::Internal(e.to_string()))?;
            if asset.owner_user_id != ctx.user_id {
                return Err(ToolError::NotAuthorized(format!("asset {asset_id}")));
            }

            match args.operation.as_str() {
                "get_url" => Ok(json!({ "url": ctx.blob.url_for(&asset.blob_key) })),
                "delete" => {
                    ctx.db.delete(&key).await?;
                    ctx.blob.delete(&asset.blob_key).await?;
                    Ok(json!({ "deleted": true }))
                }
                other => Err(ToolError::Validation(format!("unknown operation: {other}"))),
            }
        })
    }
}
