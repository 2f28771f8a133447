//! `Db` key conventions the router and orchestrator read directly.
//! Mirrors the layout `canvas-tools` writes under (world/story/asset
//! rows); duplicated here rather than imported since `canvas-orch`
//! treats tool-side storage as an implementation detail it only reads,
//! never owns.

use layer0::{StoryId, TrajectoryId, WorldId};

/// Key for a world's full row.
pub fn world(world_id: &WorldId) -> String {
    format!("world:{}", world_id.as_str())
}

/// Key for a story's full row (segments embedded).
pub fn story(story_id: &StoryId) -> String {
    format!("story:{}", story_id.as_str())
}

/// Key for a user's preferences object.
pub fn preferences(user_id: &layer0::UserId) -> String {
    format!("prefs:{}", user_id.as_str())
}

/// Key for an agent's full row, keyed by its own id. Distinct from the
/// `ContextKey::as_db_key()` mapping, which only stores the id.
pub fn agent(agent_id: &layer0::AgentId) -> String {
    format!("agent:{}", agent_id.as_str())
}

/// Key for a trajectory's full row.
pub fn trajectory(trajectory_id: &TrajectoryId) -> String {
    format!("trajectory:{}", trajectory_id.as_str())
}
