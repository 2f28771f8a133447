//! Agents and their memory blocks.

use std::collections::BTreeMap;

use layer0::{AgentId, StoryId, UserId, WorldId};
use serde::{Deserialize, Serialize};

/// What kind of conversational context an agent is bound to. Determines
/// the permitted tool set and the memory block schema reconciled before
/// each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// One persistent agent per user, independent of any world.
    User,
    /// One agent per `(userId, worldId)` pair.
    World,
    /// Shared experience-capable agent per user (images, canvas, assets).
    Experience,
}

/// The optional world/story scope an agent is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentScope {
    /// The world this agent is scoped to, if any.
    pub world_id: Option<WorldId>,
    /// The story currently in context for this agent, if any.
    pub story_id: Option<StoryId>,
}

/// Canonical memory block labels the core reconciles before every turn.
pub const BLOCK_PERSONA: &str = "persona";
/// See [`BLOCK_PERSONA`].
pub const BLOCK_CURRENT_WORLD: &str = "current_world";
/// See [`BLOCK_PERSONA`].
pub const BLOCK_CURRENT_STORY: &str = "current_story";
/// See [`BLOCK_PERSONA`].
pub const BLOCK_USER_PREFERENCES: &str = "user_preferences";
/// See [`BLOCK_PERSONA`].
pub const BLOCK_EXPERIENCE_CAPABILITIES: &str = "experience_capabilities";

/// Maximum size, in bytes, of a single memory block value.
pub const MEMORY_BLOCK_MAX_BYTES: usize = 8 * 1024;

/// The largest byte index `<= index` that lands on a UTF-8 character
/// boundary in `s`. `str::truncate` panics otherwise, which an 8 KiB
/// cap on arbitrary user text would otherwise hit whenever a multibyte
/// character straddles the cut point.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// A small mapping from block label to free-form text, reconciled with
/// application state before each turn. Labels are canonicalized to
/// lowercase on write; values are capped at [`MEMORY_BLOCK_MAX_BYTES`]
/// and truncated (not rejected) past the cap, matching the way a
/// context window summary is capped rather than refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBlockSet {
    blocks: BTreeMap<String, String>,
}

impl MemoryBlockSet {
    /// An empty block set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a block's current value.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.blocks.get(&label.to_lowercase()).map(String::as_str)
    }

    /// Set a block's value, canonicalizing the label and truncating the
    /// value to the size cap. Returns `true` if the stored value
    /// actually changed (used by the reconciliation idempotence check).
    pub fn set(&mut self, label: &str, value: impl Into<String>) -> bool {
        let label = label.to_lowercase();
        let mut value = value.into();
        if value.len() > MEMORY_BLOCK_MAX_BYTES {
            value.truncate(floor_char_boundary(&value, MEMORY_BLOCK_MAX_BYTES));
        }
        let changed = self.blocks.get(&label) != Some(&value);
        self.blocks.insert(label, value);
        changed
    }

    /// Clear a block, if present. Returns `true` if a value was removed.
    pub fn clear(&mut self, label: &str) -> bool {
        self.blocks.remove(&label.to_lowercase()).is_some()
    }

    /// Iterate over all blocks in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.blocks.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A conversational identity maintained by the external agent runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier addressed by the agent runtime.
    pub agent_id: AgentId,
    /// The user this agent belongs to.
    pub owner_user_id: UserId,
    /// What kind of context this agent serves.
    pub kind: AgentKind,
    /// The world/story scope, if any.
    pub scope: AgentScope,
    /// Reconciled memory blocks.
    pub memory_block_set: MemoryBlockSet,
}

impl Agent {
    /// Construct a freshly created agent with an empty block set.
    pub fn new(agent_id: AgentId, owner_user_id: UserId, kind: AgentKind, scope: AgentScope) -> Self {
        Self {
            agent_id,
            owner_user_id,
            kind,
            scope,
            memory_block_set: MemoryBlockSet::new(),
        }
    }
}

/// The context key the router maps to an `AgentId`: `(userId, kind, scope)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextKey {
    /// The owning user.
    pub user_id: String,
    /// The agent kind, serialized as its canonical name.
    pub kind: &'static str,
    /// The world scope, if any.
    pub world_id: Option<String>,
}

impl ContextKey {
    /// Build the context key for a User-kind agent.
    pub fn user(user_id: &UserId) -> Self {
        Self {
            user_id: user_id.as_str().to_owned(),
            kind: "user",
            world_id: None,
        }
    }

    /// Build the context key for a World-kind agent.
    pub fn world(user_id: &UserId, world_id: &WorldId) -> Self {
        Self {
            user_id: user_id.as_str().to_owned(),
            kind: "world",
            world_id: Some(world_id.as_str().to_owned()),
        }
    }

    /// Build the context key for an Experience-kind agent.
    pub fn experience(user_id: &UserId) -> Self {
        Self {
            user_id: user_id.as_str().to_owned(),
            kind: "experience",
            world_id: None,
        }
    }

    /// The flat string used as the DB key for the persistent mapping.
    pub fn as_db_key(&self) -> String {
        match &self.world_id {
            Some(w) => format!("agentmap\0{}\0{}\0{}", self.user_id, self.kind, w),
            None => format!("agentmap\0{}\0{}", self.user_id, self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_set_canonicalizes_label_case() {
        let mut blocks = MemoryBlockSet::new();
        blocks.set("PERSONA", "a helpful guide");
        assert_eq!(blocks.get("persona"), Some("a helpful guide"));
    }

    #[test]
    fn block_set_truncates_oversized_values() {
        let mut blocks = MemoryBlockSet::new();
        let huge = "x".repeat(MEMORY_BLOCK_MAX_BYTES + 100);
        blocks.set(BLOCK_CURRENT_WORLD, huge);
        assert_eq!(blocks.get(BLOCK_CURRENT_WORLD).unwrap().len(), MEMORY_BLOCK_MAX_BYTES);
    }

    #[test]
    fn block_set_set_reports_no_change_when_identical() {
        let mut blocks = MemoryBlockSet::new();
        assert!(blocks.set(BLOCK_PERSONA, "hello"));
        assert!(!blocks.set(BLOCK_PERSONA, "hello"));
        assert!(blocks.set(BLOCK_PERSONA, "hello there"));
    }

    #[test]
    fn block_set_truncates_without_splitting_a_multibyte_character() {
        let mut blocks = MemoryBlockSet::new();
        // Pad to exactly the cap with ASCII, then place a 4-byte
        // character straddling the boundary.
        let mut huge = "x".repeat(MEMORY_BLOCK_MAX_BYTES - 2);
        huge.push('\u{1F600}');
        blocks.set(BLOCK_CURRENT_WORLD, huge);
        let stored = blocks.get(BLOCK_CURRENT_WORLD).unwrap();
        assert!(stored.len() <= MEMORY_BLOCK_MAX_BYTES);
        assert!(stored.is_char_boundary(stored.len()));
    }

    #[test]
    fn context_key_distinguishes_kinds() {
        let u = UserId::new("u1");
        let w = WorldId::new("w1");
        assert_ne!(ContextKey::user(&u).as_db_key(), ContextKey::world(&u, &w).as_db_key());
        assert_ne!(ContextKey::user(&u).as_db_key(), ContextKey::experience(&u).as_db_key());
    }
}
