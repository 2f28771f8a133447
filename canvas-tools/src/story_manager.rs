//! `story_manager`: create stories, append segments, load and list them.
//! World-kind tool. Stories have no owner field of their own; ownership
//! is enforced transitively through the parent world.

use std::future::Future;
use std::pin::Pin;

use canvas_tool::{ToolContext, ToolDyn, ToolError};
use canvas_types::{Segment, Story};
use layer0::{SegmentId, StoryId, WorldId};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::keys;

/// Creates, appends to, loads, and lists stories within a world.
pub struct StoryManager;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    operation: String,
    world_id: Option<String>,
    story_id: Option<String>,
    title: Option<String>,
    text: Option<String>,
}

impl ToolDyn for StoryManager {
    fn name(&self) -> &str {
        "story_manager"
    }

    fn description(&self) -> &str {
        "Create stories, append segments, load, and list stories within a world"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {"type": "string", "enum": ["create", "save_segment", "load", "list"]},
                "worldId": {"type": "string"},
                "storyId": {"type": "string"},
                "title": {"type": "string"},
                "text": {"type": "string"},
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
                "create" => create(ctx, args).await,
                "save_segment" => save_segment(ctx, args).await,
                "load" => load(ctx, args).await,
                "list" => list(ctx, args).await,
                other => Err(ToolError::Validation(format!("unknown operation: {other}"))),
            }
        })
    }
}

async fn assert_owns_world(ctx: &ToolContext, world_id: &WorldId) -> Result<(), ToolError> {
    let raw = ctx
        .db
        .read(&keys::world(world_id))
        .await?
        .ok_or_else(|| ToolError::NotFound(format!("world {world_id}")))?;
    let world: canvas_types::World =
        serde_json::from_value(raw).map_err(|e| ToolError::Internal(e.to_string()))?;
    if world.owner_user_id != ctx.user_id {
        return Err(ToolError::NotAuthorized(format!("world {world_id}")));
    }
    Ok(())
}

async fn load_story(ctx: &ToolContext, story_id: &StoryId) -> Result<Story, ToolError> {
    let raw = ctx
        .db
        .read(&keys::story(story_id))
        .await?
        .ok_or_else(|| ToolError::NotFound(format!("story {story_id}")))?;
    serde_json::from_value(raw).map_err(|e| ToolError::Internal(e.to_string()))
}

async fn create(ctx: &ToolContext, args: Args) -> Result<Value, ToolError> {
    let world_id = args
        .world_id
        .map(WorldId::new)
        .ok_or_else(|| ToolError::Validation("create requires worldId".into()))?;
    let title = args
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ToolError::Validation("create requires a non-empty title".into()))?;
    assert_owns_world(ctx, &world_id).await?;

    let story = Story::new(StoryId::new(Uuid::new_v4().to_string()), world_id, title, ctx.now);
    ctx.db
        .write(&keys::story(&story.story_id), serde_json::to_value(&story).unwrap())
        .await?;
    Ok(json!({ "storyId": story.story_id }))
}

async fn save_segment(ctx: &ToolContext, args: Args) -> Result<Value, ToolError> {
    let story_id = args
        .story_id
        .map(StoryId::new)
        .ok_or_else(|| ToolError::Validation("save_segment requires storyId".into()))?;
    let text = args
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ToolError::Validation("save_segment requires non-empty text".into()))?;

    let mut story = load_story(ctx, &story_id).await?;
    assert_owns_world(ctx, &story.world_id).await?;

    let order = story.next_order();
    let segment = Segment {
        segment_id: SegmentId::new(Uuid::new_v4().to_string()),
        story_id: story.story_id.clone(),
        order,
        text,
        created_at: ctx.now,
    };
    story.push_segment(segment.clone(), ctx.now);
    ctx.db
        .write(&keys::story(&story.story_id), serde_json::to_value(&story).unwrap())
        .await?;
    Ok(json!({ "segmentId": segment.segment_id, "order": segment.order }))
}

async fn load(ctx: &ToolContext, args: Args) -> Result<Value, ToolError> {
    let story_id = args
        .story_id
        .map(StoryId::new)
        .ok_or_else(|| ToolError::Validation("load requires storyId".into()))?;
    let story = load_story(ctx, &story_id).await?;
    assert_owns_world(ctx, &story.world_id).await?;
    Ok(json!({ "story": story, "segments": story.segments }))
}

async fn list(ctx: &ToolContext, args: Args) -> Result<Value, ToolError> {
    let world_id = args
        .world_id
        .map(WorldId::new)
        .ok_or_else(|| ToolError::Validation("list requires worldId".into()))?;
    assert_owns_world(ctx, &world_id).await?;

    let keys = ctx.db.list(keys::STORY_PREFIX).await?;
    let mut stories = Vec::new();
    for key in keys {
        let Some(raw) = ctx.db.read(&key).await? else { continue };
        let story: Story = serde_json::from_value(raw).map_err(|e| ToolError::Internal(e.to_string()))?;
        if story.world_id == world_id {
            stories.push(json!({
                "storyId": story.story_id,
                "title": story.title,
                "segmentCount": story.segments.len(),
                "updatedAt": story.updated_at,
            }));
        }
    }
    Ok(json!({ "stories": stories }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context, test_context_sharing_state};
    use crate::world_manager::WorldManager;
    use layer0::UserId;

    async fn setup_world(ctx: &ToolContext) -> String {
        let out = WorldManager
            .call(json!({"operation": "save", "data": {"title": "Aethel"}}), ctx)
            .await
            .unwrap();
        out["worldId"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn create_save_segment_load_round_trips() {
        let ctx = test_context();
        let world_id = setup_world(&ctx).await;
        let tool = StoryManager;

        let created = tool
            .call(json!({"operation": "create", "worldId": world_id, "title": "Chapter One"}), &ctx)
            .await
            .unwrap();
        let story_id = created["storyId"].as_str().unwrap().to_owned();

        let saved = tool
            .call(json!({"operation": "save_segment", "storyId": story_id, "text": "Once upon a time."}), &ctx)
            .await
            .unwrap();
        assert_eq!(saved["order"], 0);

        let loaded = tool.call(json!({"operation": "load", "storyId": story_id}), &ctx).await.unwrap();
        assert_eq!(loaded["segments"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_returns_only_stories_for_requested_world() {
        let ctx = test_context();
        let world_id = setup_world(&ctx).await;
        let tool = StoryManager;
        tool.call(json!({"operation": "create", "worldId": world_id, "title": "Chapter One"}), &ctx)
            .await
            .unwrap();

        let out = tool.call(json!({"operation": "list", "worldId": world_id}), &ctx).await.unwrap();
        assert_eq!(out["stories"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_for_unowned_world_is_not_authorized() {
        let ctx = test_context();
        let world_id = setup_world(&ctx).await;
        let intruder = test_context_sharing_state(&ctx, UserId::new("u2"));

        let err = StoryManager
            .call(json!({"operation": "create", "worldId": world_id, "title": "Stolen"}), &intruder)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn create_rejects_empty_title() {
        let ctx = test_context();
        let world_id = setup_world(&ctx).await;
        let err = StoryManager
            .call(json!({"operation": "create", "worldId": world_id, "title": "  "}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }
}
