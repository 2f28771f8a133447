//! The agent router: maintains a persistent `contextKey -> agentId`
//! mapping and drives lazy, serialized agent creation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use canvas_state::Db;
use canvas_types::{Agent, AgentKind, AgentScope, ContextKey, Story};
use layer0::{AgentId, CanvasError, StoryId, UserId, WorldId};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::keys;

/// Trailing segments folded into the `current_story` block when
/// `setStoryContext` is called directly (outside the full world-kind
/// reconciliation pass).
const STORY_EXCERPT_COUNT: usize = 5;

/// Given a `(userId, kind, scope)` context key, returns or lazily
/// creates the matching [`Agent`]. Creation is serialized per context
/// key: a first-use race acquires a private per-key lock before
/// re-checking `Db`, so two concurrent callers never mint two agents
/// for the same key. The mapping is written before the id is handed
/// back, so a crash-restart sees the same agent on the next lookup.
pub struct AgentRouter {
    db: Arc<dyn Db>,
    creation_locks: RwLock<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl AgentRouter {
    /// Build a router over the given `Db`.
    pub fn new(db: Arc<dyn Db>) -> Self {
        Self {
            db,
            creation_locks: RwLock::new(HashMap::new()),
        }
    }

    fn lock_for(&self, map_key: &str) -> Arc<AsyncMutex<()>> {
        if let Some(lock) = self.creation_locks.read().unwrap().get(map_key) {
            return Arc::clone(lock);
        }
        let mut locks = self.creation_locks.write().unwrap();
        Arc::clone(
            locks
                .entry(map_key.to_owned())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    async fn lookup(&self, map_key: &str) -> Result<Option<AgentId>, CanvasError> {
        match self.db.read(map_key).await? {
            Some(Value::String(id)) => Ok(Some(AgentId::new(id))),
            Some(_) => Err(CanvasError::Internal(format!(
                "corrupt agent map entry at {map_key}"
            ))),
            None => Ok(None),
        }
    }

    async fn get_or_create(
        &self,
        key: ContextKey,
        owner_user_id: &UserId,
        kind: AgentKind,
        scope: AgentScope,
    ) -> Result<AgentId, CanvasError> {
        let map_key = key.as_db_key();
        if let Some(id) = self.lookup(&map_key).await? {
            return Ok(id);
        }

        let lock = self.lock_for(&map_key);
        let _guard = lock.lock().await;
        // Re-check: another caller may have created the agent while we
        // were waiting for the lock.
        if let Some(id) = self.lookup(&map_key).await? {
            return Ok(id);
        }

        let agent_id = AgentId::new(Uuid::new_v4().to_string());
        let agent = Agent::new(agent_id.clone(), owner_user_id.clone(), kind, scope);
        self.save_agent(&agent).await?;
        self.db
            .write(&map_key, Value::String(agent_id.as_str().to_owned()))
            .await?;
        Ok(agent_id)
    }

    /// Return the persistent User-kind agent for `user_id`, creating
    /// it on first call.
    pub async fn get_or_create_user_agent(&self, user_id: &UserId) -> Result<AgentId, CanvasError> {
        self.get_or_create(ContextKey::user(user_id), user_id, AgentKind::User, AgentScope::default())
            .await
    }

    /// Return the World-kind agent for `(user_id, world_id)`, creating
    /// it on first call. Requires `user_id` to own `world_id`.
    pub async fn get_or_create_world_agent(&self, user_id: &UserId, world_id: &WorldId) -> Result<AgentId, CanvasError> {
        let world_value = self
            .db
            .read(&keys::world(world_id))
            .await?
            .ok_or_else(|| CanvasError::NotFound(format!("world {world_id}")))?;
        let owner: UserId = serde_json::from_value(
            world_value
                .get("ownerUserId")
                .or_else(|| world_value.get("owner_user_id"))
                .cloned()
                .ok_or_else(|| CanvasError::Internal("world row missing owner".into()))?,
        )
        .map_err(|e| CanvasError::Internal(e.to_string()))?;
        if &owner != user_id {
            return Err(CanvasError::NotAuthorized(format!(
                "user {user_id} does not own world {world_id}"
            )));
        }

        let scope = AgentScope {
            world_id: Some(world_id.clone()),
            story_id: None,
        };
        self.get_or_create(ContextKey::world(user_id, world_id), user_id, AgentKind::World, scope)
            .await
    }

    /// Return the shared Experience-kind agent for `user_id`, creating
    /// it on first call.
    pub async fn get_or_create_experience_agent(&self, user_id: &UserId) -> Result<AgentId, CanvasError> {
        self.get_or_create(ContextKey::experience(user_id), user_id, AgentKind::Experience, AgentScope::default())
            .await
    }

    /// Load an agent's full row by id.
    pub async fn load_agent(&self, agent_id: &AgentId) -> Result<Agent, CanvasError> {
        let value = self
            .db
            .read(&keys::agent(agent_id))
            .await?
            .ok_or_else(|| CanvasError::NotFound(format!("agent {agent_id}")))?;
        serde_json::from_value(value).map_err(|e| CanvasError::Internal(e.to_string()))
    }

    /// Persist an agent's full row.
    pub async fn save_agent(&self, agent: &Agent) -> Result<(), CanvasError> {
        let value = serde_json::to_value(agent).map_err(|e| CanvasError::Internal(e.to_string()))?;
        self.db.write(&keys::agent(&agent.agent_id), value).await
    }

    /// Write the story summary (title and trailing segment excerpts)
    /// into `agent_id`'s `current_story` memory block, or clear it when
    /// `story` is `None`.
    pub async fn set_story_context(&self, agent_id: &AgentId, story: Option<&Story>) -> Result<(), CanvasError> {
        let mut agent = self.load_agent(agent_id).await?;
        agent.scope.story_id = story.map(|s| s.story_id.clone());

        let changed = match story {
            Some(story) => {
                let excerpts = story.last_segment_excerpts(STORY_EXCERPT_COUNT);
                let summary = serde_json::json!({
                    "title": story.title,
                    "excerpts": excerpts,
                })
                .to_string();
                agent
                    .memory_block_set
                    .set(canvas_types::agent::BLOCK_CURRENT_STORY, summary)
            }
            None => agent
                .memory_block_set
                .clear(canvas_types::agent::BLOCK_CURRENT_STORY),
        };

        if changed {
            self.save_agent(&agent).await?;
        }
        Ok(())
    }

    /// Used by callers that don't have a `StoryId` in hand yet, only
    /// the target agent and a row to load.
    pub async fn load_story(&self, story_id: &StoryId) -> Result<Story, CanvasError> {
        let value = self
            .db
            .read(&keys::story(story_id))
            .await?
            .ok_or_else(|| CanvasError::NotFound(format!("story {story_id}")))?;
        serde_json::from_value(value).map_err(|e| CanvasError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_state::MemoryDb;
    use canvas_types::World;
    use chrono::Utc;

    fn now() -> chrono::DateTime<Utc> {
        Utc::now()
    }

    #[tokio::test]
    async fn concurrent_first_use_returns_the_same_agent() {
        let router = Arc::new(AgentRouter::new(Arc::new(MemoryDb::new())));
        let user = UserId::new("u1");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let router = Arc::clone(&router);
            let user = user.clone();
            handles.push(tokio::spawn(async move { router.get_or_create_user_agent(&user).await.unwrap() }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn world_agent_creation_denied_to_non_owner() {
        let db = Arc::new(MemoryDb::new());
        let owner = UserId::new("owner");
        let world = World::new(WorldId::new("w1"), owner.clone(), serde_json::json!({"title": "Aethel"}), now());
        db.write(&keys::world(&world.world_id), serde_json::to_value(&world).unwrap())
            .await
            .unwrap();

        let router = AgentRouter::new(db);
        let intruder = UserId::new("intruder");
        let err = router.get_or_create_world_agent(&intruder, &WorldId::new("w1")).await.unwrap_err();
        assert_eq!(err.kind(), "NotAuthorized");
    }

    #[tokio::test]
    async fn set_story_context_clears_block_when_none() {
        let db = Arc::new(MemoryDb::new());
        let owner = UserId::new("owner");
        let world = World::new(WorldId::new("w1"), owner.clone(), serde_json::json!({"title": "Aethel"}), now());
        db.write(&keys::world(&world.world_id), serde_json::to_value(&world).unwrap())
            .await
            .unwrap();

        let router = AgentRouter::new(db);
        let agent_id = router.get_or_create_world_agent(&owner, &WorldId::new("w1")).await.unwrap();

        let mut story = Story::new(StoryId::new("s1"), WorldId::new("w1"), "Chapter One", now());
        story.push_segment(
            canvas_types::Segment {
                segment_id: layer0::SegmentId::new("seg1"),
                story_id: story.story_id.clone(),
                order: 0,
                text: "Once upon a time.".into(),
                created_at: now(),
            },
            now(),
        );

        router.set_story_context(&agent_id, Some(&story)).await.unwrap();
        let agent = router.load_agent(&agent_id).await.unwrap();
        assert!(agent.memory_block_set.get(canvas_types::agent::BLOCK_CURRENT_STORY).is_some());
        assert_eq!(agent.scope.story_id, Some(story.story_id.clone()));

        router.set_story_context(&agent_id, None).await.unwrap();
        let agent = router.load_agent(&agent_id).await.unwrap();
        assert!(agent.memory_block_set.get(canvas_types::agent::BLOCK_CURRENT_STORY).is_none());
        assert_eq!(agent.scope.story_id, None);
    }
}
