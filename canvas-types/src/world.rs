//! Worlds: the owner-scoped document tree a story is set in.

use chrono::{DateTime, Utc};
use layer0::{UserId, WorldId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A world's document tree and ownership metadata. `foundation` is a
/// tree-shaped JSON document; tool calls apply path-addressed updates
/// to it rather than replacing it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Stable identifier.
    pub world_id: WorldId,
    /// The only user permitted to read or write this world.
    pub owner_user_id: UserId,
    /// The world's document tree.
    pub foundation: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp, bumped on every `save`/`update`.
    pub updated_at: DateTime<Utc>,
}

impl World {
    /// Construct a newly created world with the given foundation.
    pub fn new(world_id: WorldId, owner_user_id: UserId, foundation: Value, now: DateTime<Utc>) -> Self {
        Self {
            world_id,
            owner_user_id,
            foundation,
            created_at: now,
            updated_at: now,
        }
    }

    /// A compact summary suitable for the `current_world` memory block:
    /// title, pillars, and the last-updated timestamp.
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "title": self.foundation.get("title").cloned().unwrap_or(Value::Null),
            "pillars": self.foundation.get("pillars").cloned().unwrap_or(Value::Null),
            "updatedAt": self.updated_at,
        })
    }
}
