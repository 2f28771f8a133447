//! Typed ID wrappers for every identifier crossing a protocol boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up a `WorldId` with a `StoryId`, etc.
/// These are just strings underneath — no UUID enforcement, no format
/// requirement. Callers are free to mint them however they like.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a human user.");
typed_id!(AgentId, "Unique identifier for an agent instance.");
typed_id!(WorldId, "Unique identifier for a world.");
typed_id!(StoryId, "Unique identifier for a story within a world.");
typed_id!(SegmentId, "Unique identifier for a story segment.");
typed_id!(AssetId, "Unique identifier for a stored asset.");
typed_id!(ToolCallId, "Unique identifier for a single tool call.");
typed_id!(TurnId, "Unique identifier for a turn.");
typed_id!(TrajectoryId, "Unique identifier for a captured trajectory.");
typed_id!(
    ComponentId,
    "Unique identifier for a canvas UI component instance."
);
