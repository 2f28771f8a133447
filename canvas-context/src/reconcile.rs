//! Memory block reconciliation: before each turn, the router refreshes
//! an agent's memory blocks from authoritative application state rather
//! than trusting whatever the runtime cached from the prior turn.
//! Reconciliation is idempotent — [`MemoryBlockSet::set`] already
//! reports whether a value actually changed, so a caller can skip the
//! runtime write entirely when nothing moved.

use canvas_tool::ToolRegistry;
use canvas_types::agent::{
    BLOCK_CURRENT_STORY, BLOCK_CURRENT_WORLD, BLOCK_EXPERIENCE_CAPABILITIES, BLOCK_PERSONA,
    BLOCK_USER_PREFERENCES,
};
use canvas_types::{MemoryBlockSet, Story, World};
use serde_json::Value;

/// Number of trailing segments summarized into the `current_story`
/// block. Keeps the block well under the 8 KiB cap for any
/// reasonably-sized segment without truncating mid-sentence as often
/// as a byte cap alone would.
const STORY_EXCERPT_COUNT: usize = 5;

/// Refresh the User-kind blocks: `persona` (static system text) and
/// `user_preferences` (serialized from DB). Returns `true` if either
/// block's value actually changed.
pub fn reconcile_user_blocks(blocks: &mut MemoryBlockSet, persona: &str, preferences: &Value) -> bool {
    let persona_changed = blocks.set(BLOCK_PERSONA, persona);
    let prefs_text = preferences.to_string();
    let prefs_changed = blocks.set(BLOCK_USER_PREFERENCES, prefs_text);
    persona_changed || prefs_changed
}

/// Refresh the World-kind blocks: `current_world` always, `current_story`
/// when `story` is `Some`, cleared when `None`. Returns `true` if
/// anything changed.
pub fn reconcile_world_blocks(blocks: &mut MemoryBlockSet, world: &World, story: Option<&Story>) -> bool {
    let world_summary = world.summary().to_string();
    let mut changed = blocks.set(BLOCK_CURRENT_WORLD, world_summary);

    changed |= match story {
        Some(story) => {
            let excerpts = story.last_segment_excerpts(STORY_EXCERPT_COUNT);
            let summary = serde_json::json!({
                "title": story.title,
                "excerpts": excerpts,
            })
            .to_string();
            blocks.set(BLOCK_CURRENT_STORY, summary)
        }
        None => blocks.clear(BLOCK_CURRENT_STORY),
    };
    changed
}

/// Refresh the Experience-kind `experience_capabilities` block: a
/// compact listing of the tool names and descriptions available to
/// this agent kind. Returns `true` if the listing changed (e.g. a tool
/// set was reconfigured between process restarts).
pub fn reconcile_experience_blocks(blocks: &mut MemoryBlockSet, registry: &ToolRegistry) -> bool {
    let mut capabilities: Vec<Value> = registry
        .iter()
        .map(|tool| serde_json::json!({ "name": tool.name(), "description": tool.description() }))
        .collect();
    capabilities.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
    blocks.set(BLOCK_EXPERIENCE_CAPABILITIES, Value::Array(capabilities).to_string())
}
