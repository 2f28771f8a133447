//! `world_manager`: save/load/update a world's foundation document.
//! World-kind tool.

use std::future::Future;
use std::pin::Pin;

use canvas_state::DbExt;
use canvas_tool::{ToolContext, ToolDyn, ToolError};
use canvas_types::World;
use layer0::{CanvasError, WorldId};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::keys;
use crate::path::{apply_updates, PathUpdate};

/// Persists, returns, and patches a world's `foundation` tree.
pub struct WorldManager;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    operation: String,
    world_id: Option<String>,
    data: Option<Value>,
    updates: Option<Vec<UpdateEntry>>,
}

#[derive(Deserialize)]
struct UpdateEntry {
    path: String,
    value: Value,
}

impl ToolDyn for WorldManager {
    fn name(&self) -> &str {
        "world_manager"
    }

    fn description(&self) -> &str {
        "Save, load, or patch a world's foundation document"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {"type": "string", "enum": ["save", "load", "update"]},
                "worldId": {"type": "string"},
                "data": {"type": "object"},
                "updates": {"type": "array"},
            },
            "required": ["operation"],
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
            match args.operation.as_str() {
                "save" => save(ctx, args).await,
                "load" => load(ctx, args).await,
                "update" => update(ctx, args).await,
                other => Err(ToolError::Validation(format!("unknown operation: {other}"))),
            }
        })
    }
}

async fn load_owned(ctx: &ToolContext, world_id: &WorldId) -> Result<World, ToolError> {
    let key = keys::world(world_id);
    let raw = ctx
        .db
        .read(&key)
        .await?
        .ok_or_else(|| ToolError::NotFound(format!("world {world_id}")))?;
    let world: World = serde_json::from_value(raw).map_err(|e| ToolError::Internal(e.to_string()))?;
    if world.owner_user_id != ctx.user_id {
        return Err(ToolError::NotAuthorized(format!("world {world_id}")));
    }
    Ok(world)
}

async fn save(ctx: &ToolContext, args: Args) -> Result<Value, ToolError> {
    let data = args
        .data
        .ok_or_else(|| ToolError::Validation("save requires data".into()))?;

    let world = match args.world_id {
        Some(id) => {
            let world_id = WorldId::new(id);
            match load_owned(ctx, &world_id).await {
                Ok(mut existing) => {
                    existing.foundation = data;
                    existing.updated_at = ctx.now;
                    existing
                }
                Err(ToolError::NotFound(_)) => {
                    World::new(world_id, ctx.user_id.clone(), data, ctx.now)
                }
                Err(other) => return Err(other),
            }
        }
        None => World::new(WorldId::new(Uuid::new_v4().to_string()), ctx.user_id.clone(), data, ctx.now),
    };

    ctx.db
        .write(&keys::world(&world.world_id), serde_json::to_value(&world).unwrap())
        .await?;
    Ok(json!({ "worldId": world.world_id, "updatedAt": world.updated_at }))
}

async fn load(ctx: &ToolContext, args: Args) -> Result<Value, ToolError> {
    let world_id = args
        .world_id
        .map(WorldId::new)
        .ok_or_else(|| ToolError::Validation("load requires worldId".into()))?;
    let world = load_owned(ctx, &world_id).await?;
    Ok(json!({ "worldId": world.world_id, "foundation": world.foundation, "updatedAt": world.updated_at }))
}

async fn update(ctx: &ToolContext, args: Args) -> Result<Value, ToolError> {
    let world_id = args
        .world_id
        .map(WorldId::new)
        .ok_or_else(|| ToolError::Validation("update requires worldId".into()))?;
    let updates = args
        .updates
        .ok_or_else(|| ToolError::Validation("update requires updates".into()))?;
    let path_updates: Vec<PathUpdate<'_>> = updates
        .iter()
        .map(|u| PathUpdate { path: u.path.as_str(), value: u.value.clone() })
        .collect();

    let owner_user_id = ctx.user_id.clone();
    let now = ctx.now;
    let world_id_str = world_id.to_string();

    let updated = ctx
        .db
        .update(&keys::world(&world_id), move |current| {
            let raw = current.ok_or_else(|| CanvasError::NotFound(format!("world {world_id_str}")))?;
            let mut world: World =
                serde_json::from_value(raw).map_err(|e| CanvasError::Internal(e.to_string()))?;
            if world.owner_user_id != owner_user_id {
                return Err(CanvasError::NotAuthorized(format!("world {world_id_str}")));
            }
            world.foundation = apply_updates(&world.foundation, &path_updates).map_err(CanvasError::from)?;
            world.updated_at = now;
            serde_json::to_value(&world).map_err(|e| CanvasError::Internal(e.to_string()))
        })
        .await?;

    let world: World = serde_json::from_value(updated).map_err(|e| ToolError::Internal(e.to_string()))?;
    Ok(json!({ "worldId": world.world_id, "foundation": world.foundation, "updatedAt": world.updated_at }))
}
