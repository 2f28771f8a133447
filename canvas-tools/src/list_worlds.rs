//! `list_worlds`: worlds owned by the caller. User-kind tool.

use std::future::Future;
use std::pin::Pin;

use canvas_tool::{ToolContext, ToolDyn, ToolError};
use canvas_types::World;
use serde_json::{json, Value};

use crate::keys;

/// Lists every world owned by `ctx.user_id`.
pub struct ListWorlds;

impl ToolDyn for ListWorlds {
    fn name(&self) -> &str {
        "list_worlds"
    }

    fn description(&self) -> &str {
        "List worlds owned by the calling user"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn call<'a>(
        &'a self,
        _args: Value,
        ctx: &'a ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>> {
        Box::pin(async move {
            let keys = ctx.db.list(keys::WORLD_PREFIX).await?;
            let mut worlds = Vec::with_capacity(keys.len());
            for key in keys {
                let Some(raw) = ctx.db.read(&key).await? else { continue };
                let world: World =
                    serde_json::from_value(raw).map_err(|e| ToolError::Internal(e.to_string()))?;
                if world.owner_user_id == ctx.user_id {
                    worlds.push(json!({
                        "worldId": world.world_id,
                        "title": world.foundation.get("title").cloned().unwrap_or(Value::Null),
                        "updatedAt": world.updated_at,
                    }));
                }
            }
            Ok(json!({ "worlds": worlds }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context, test_context_sharing_state};
    use crate::world_manager::WorldManager;
    use layer0::UserId;
    use serde_json::json;

    #[tokio::test]
    async fn returns_only_worlds_owned_by_caller() {
        let ctx = test_context();
        let world_manager = WorldManager;
        world_manager
            .call(json!({"operation": "save", "data": {"title": "Aethel"}}), &ctx)
            .await
            .unwrap();

        let other = test_context_sharing_state(&ctx, UserId::new("u2"));
        let list = ListWorlds;
        let out = list.call(json!({}), &other).await.unwrap();
        assert!(out["worlds"].as_array().unwrap().is_empty());

        let out = list.call(json!({}), &ctx).await.unwrap();
        assert_eq!(out["worlds"].as_array().unwrap().len(), 1);
        assert_eq!(out["worlds"][0]["title"], "Aethel");
    }
}
