//! Turns: one `sendMessage` invocation, from user message to the
//! agent's terminal stop.

use chrono::{DateTime, Utc};
use layer0::{AgentId, ToolCallId, TurnId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why the agent runtime's stream ended, as reported in its final
/// `stop_reason` chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The agent reached a natural completion.
    EndTurn,
    /// The stream wants the core to execute tool calls and post
    /// results back before continuing.
    RequiresApproval,
    /// Any other terminal status the runtime reports, carried through
    /// verbatim.
    Other(String),
}

impl StopReason {
    /// Parse the runtime's wire value for `stop_reason`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "end_turn" => StopReason::EndTurn,
            "requires_approval" => StopReason::RequiresApproval,
            other => StopReason::Other(other.to_owned()),
        }
    }

    /// Whether this stop reason ends the approval loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StopReason::RequiresApproval)
    }
}

/// A plain assistant message produced during a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// The assistant's text content.
    pub text: String,
}

/// A tool call accumulated during an approval batch. `arguments_raw` is
/// the concatenation of every argument-delta chunk that shared this
/// `tool_call_id`, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique within the enclosing turn.
    pub tool_call_id: ToolCallId,
    /// The tool being requested. May be absent until the first chunk
    /// for this id arrives with a `tool_name`.
    pub tool_name: Option<String>,
    /// The concatenated, not-yet-parsed argument string.
    pub arguments_raw: String,
    /// The parsed argument object, once `arguments_raw` has been parsed
    /// as JSON.
    pub arguments_parsed: Option<Value>,
}

impl ToolCall {
    /// Start accumulating a new tool call.
    pub fn new(tool_call_id: ToolCallId) -> Self {
        Self {
            tool_call_id,
            tool_name: None,
            arguments_raw: String::new(),
            arguments_parsed: None,
        }
    }

    /// Append an argument-delta chunk, optionally setting the tool
    /// name on the first chunk that carries one.
    pub fn push_delta(&mut self, tool_name: Option<&str>, arguments_delta: &str) {
        if let Some(name) = tool_name {
            if self.tool_name.is_none() {
                self.tool_name = Some(name.to_owned());
            }
        }
        self.arguments_raw.push_str(arguments_delta);
    }
}

/// The outcome of one executed tool call, recorded in the turn's
/// metadata regardless of success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Identifies which accumulated [`ToolCall`] this records.
    pub tool_call_id: ToolCallId,
    /// The tool that was invoked, if argument parsing succeeded.
    pub tool_name: Option<String>,
    /// Whether the tool call completed without error.
    pub success: bool,
    /// The error kind, if the call failed.
    pub error_kind: Option<String>,
}

/// One invocation of `sendMessage`, from the initial user message to
/// the agent's terminal stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Stable identifier.
    pub turn_id: TurnId,
    /// The user who sent the message.
    pub user_id: UserId,
    /// The agent that handled the turn.
    pub agent_id: AgentId,
    /// The message that started the turn.
    pub input_message: String,
    /// Every assistant message produced during the turn, in order.
    pub output_messages: Vec<AgentMessage>,
    /// Every tool call attempted during the turn, in the order the
    /// agent requested them.
    pub tool_calls: Vec<ToolCallRecord>,
    /// When the turn began.
    pub started_at: DateTime<Utc>,
    /// When the turn ended, once closed.
    pub ended_at: Option<DateTime<Utc>>,
    /// The final stop reason, once the loop exits.
    pub stop_reason: Option<StopReason>,
}

impl Turn {
    /// Start a new, open turn.
    pub fn new(turn_id: TurnId, user_id: UserId, agent_id: AgentId, input_message: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            turn_id,
            user_id,
            agent_id,
            input_message: input_message.into(),
            output_messages: Vec::new(),
            tool_calls: Vec::new(),
            started_at,
            ended_at: None,
            stop_reason: None,
        }
    }

    /// Close the turn with its final stop reason and timestamp.
    pub fn close(&mut self, stop_reason: StopReason, ended_at: DateTime<Utc>) {
        self.stop_reason = Some(stop_reason);
        self.ended_at = Some(ended_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_reason_parses_known_wire_values() {
        assert_eq!(StopReason::from_wire("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_wire("requires_approval"), StopReason::RequiresApproval);
        assert!(!StopReason::from_wire("requires_approval").is_terminal());
        assert!(StopReason::from_wire("end_turn").is_terminal());
        assert!(StopReason::from_wire("content_filter").is_terminal());
    }

    #[test]
    fn tool_call_accumulates_deltas_and_name() {
        let mut call = ToolCall::new(ToolCallId::new("tc1"));
        call.push_delta(Some("world_manager"), "{\"operation\":");
        call.push_delta(None, "\"save\"}");
        assert_eq!(call.tool_name.as_deref(), Some("world_manager"));
        assert_eq!(call.arguments_raw, "{\"operation\":\"save\"}");
    }
}
