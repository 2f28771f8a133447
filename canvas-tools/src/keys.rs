//! `Db` key conventions shared by the tool executors. The core owns no
//! schema beyond the entity shapes in `canvas-types`; these are this
//! implementation's chosen layout, not a contractual format.

use layer0::{AssetId, StoryId, UserId, WorldId};

/// Key for a world's full row.
pub fn world(world_id: &WorldId) -> String {
    format!("world:{}", world_id.as_str())
}

/// Prefix under which every world row lives, for `Db::list` scans.
pub const WORLD_PREFIX: &str = "world:";

/// Key for a story's full row (segments embedded).
pub fn story(story_id: &StoryId) -> String {
    format!("story:{}", story_id.as_str())
}

/// Prefix under which every story row lives.
pub const STORY_PREFIX: &str = "story:";

/// Key for an asset's metadata row.
pub fn asset(asset_id: &AssetId) -> String {
    format!("asset:{}", asset_id.as_str())
}

/// Key for a user's preferences object.
pub fn preferences(user_id: &UserId) -> String {
    format!("prefs:{}", user_id.as_str())
}
