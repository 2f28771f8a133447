#![deny(missing_docs)]
//! Concrete tool executors and the per-agent-kind registries the
//! orchestrator builds from them. Every tool here implements
//! `canvas_tool::ToolDyn`; the orchestrator never constructs a registry
//! that mixes tools across kinds, so an agent can never reach a tool
//! its kind doesn't list.

pub mod asset_manager;
pub mod canvas_ui;
pub mod get_canvas_interactions;
pub mod image_generator;
mod keys;
pub mod list_worlds;
mod path;
pub mod send_suggestion;
pub mod story_manager;
#[cfg(test)]
mod test_support;
pub mod user_preferences;
pub mod world_draft_generator;
pub mod world_manager;

use std::sync::Arc;

use canvas_tool::ToolRegistry;

pub use asset_manager::AssetManager;
pub use canvas_ui::CanvasUi;
pub use get_canvas_interactions::GetCanvasInteractions;
pub use image_generator::ImageGenerator;
pub use list_worlds::ListWorlds;
pub use send_suggestion::SendSuggestion;
pub use story_manager::StoryManager;
pub use user_preferences::UserPreferences;
pub use world_draft_generator::WorldDraftGenerator;
pub use world_manager::WorldManager;

/// The tool set for a User-kind agent: `world_draft_generator`,
/// `list_worlds`, `user_preferences`.
pub fn user_kind_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WorldDraftGenerator));
    registry.register(Arc::new(ListWorlds));
    registry.register(Arc::new(UserPreferences));
    registry
}

/// The tool set for a World-kind agent: `world_manager`, `story_manager`.
pub fn world_kind_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WorldManager));
    registry.register(Arc::new(StoryManager));
    registry
}

/// The tool set for an Experience-kind agent: `image_generator`,
/// `asset_manager`, `canvas_ui`, `get_canvas_interactions`,
/// `send_suggestion`.
pub fn experience_kind_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ImageGenerator));
    registry.register(Arc::new(AssetManager));
    registry.register(Arc::new(CanvasUi));
    registry.register(Arc::new(GetCanvasInteractions));
    registry.register(Arc::new(SendSuggestion));
    registry
}
