//! Canvas protocol payloads: outbound component-tree mutations and
//! inbound interaction events.

use chrono::{DateTime, Utc};
use layer0::ComponentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A recursively nested component node. `children` may itself be a mix
/// of further nodes or plain strings (literal text children).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentNode {
    /// The component's type name, e.g. `"Card"`, `"Button"`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Arbitrary props passed to the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
    /// Child nodes or literal text children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentChild>,
}

/// A single child of a [`ComponentNode`]: either a nested node or text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ComponentChild {
    /// A nested component node.
    Node(ComponentNode),
    /// A literal text child.
    Text(String),
}

/// An outbound mutation to the browser component tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum CanvasOp {
    /// Render a new component at `component_id`.
    Render {
        /// The target component's identifier.
        component_id: ComponentId,
        /// The component tree to render.
        definition: ComponentNode,
    },
    /// Update an existing component's definition.
    Update {
        /// The target component's identifier.
        component_id: ComponentId,
        /// The replacement definition.
        definition: ComponentNode,
    },
    /// Remove a component from the tree.
    Remove {
        /// The target component's identifier.
        component_id: ComponentId,
    },
    /// Re-layout a component without changing its definition.
    Layout {
        /// The target component's identifier.
        component_id: ComponentId,
        /// Layout-specific properties.
        definition: Option<Value>,
    },
}

impl CanvasOp {
    /// The component this op targets, regardless of variant.
    pub fn component_id(&self) -> &ComponentId {
        match self {
            CanvasOp::Render { component_id, .. }
            | CanvasOp::Update { component_id, .. }
            | CanvasOp::Remove { component_id }
            | CanvasOp::Layout { component_id, .. } => component_id,
        }
    }
}

/// The kind of interaction a browser component reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// A click event.
    Click,
    /// A text input change event.
    Input,
    /// A form submit event.
    Submit,
    /// A selection change event.
    Select,
    /// An application-defined event not covered above.
    Custom,
}

/// An inbound interaction event from the browser, queued in the order
/// received and delivered to the agent in that same order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// The component the interaction originated from.
    pub component_id: ComponentId,
    /// What kind of interaction this was.
    pub kind: InteractionKind,
    /// Arbitrary event payload.
    pub data: Value,
    /// When the core received the interaction.
    pub received_at: DateTime<Utc>,
}

/// A lightweight suggestion envelope, delivered over the same outbound
/// transport as [`CanvasOp`] but kept distinct from the component tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    /// Short suggestion title.
    pub title: String,
    /// Suggestion body text.
    pub body: String,
    /// Optional action identifier the browser can invoke on accept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
}

/// Anything that can be queued on a session's outbound transport. Both
/// variants share one FIFO so cross-kind ordering (e.g. a suggestion
/// enqueued between two renders) is preserved end to end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "envelope", rename_all = "snake_case")]
pub enum OutboundEnvelope {
    /// A component-tree mutation.
    Op(CanvasOp),
    /// A suggestion envelope.
    Suggestion(Suggestion),
}
