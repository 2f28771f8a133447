//! Wire-shaped types for the consumed agent runtime streaming protocol.

use layer0::ToolCallId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One element of `currentInput` passed into `messages.create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeInput {
    /// The initial user message that starts a turn.
    UserMessage {
        /// The message text.
        text: String,
    },
    /// The approval results for a batch of tool calls, posted back
    /// after the core executes them.
    Approval {
        /// One result per tool call in the batch.
        approvals: Vec<ApprovalResult>,
    },
}

/// Whether a tool call succeeded, for the approval-result envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// The tool call completed without error.
    Ok,
    /// The tool call failed; `result` carries the error envelope.
    Error,
}

/// The posted-back result of one executed tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResult {
    /// Which accumulated tool call this result answers.
    pub tool_call_id: ToolCallId,
    /// Success or failure.
    pub status: ApprovalStatus,
    /// The tool's success payload, or a typed error envelope.
    pub result: Value,
}

/// A tool descriptor passed as part of `client_tools`: the runtime
/// understands these tools are executed by the core, not by itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// The tool's name, as the runtime will reference it in
    /// `approval_request_message` chunks.
    pub name: String,
    /// JSON Schema for the tool's input parameters.
    pub schema: Value,
}

/// A single chunk from the agent runtime's streaming response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chunk {
    /// Plain assistant text, appended to the turn's output buffer.
    AssistantText {
        /// The text delta.
        text: String,
    },
    /// A tool-call approval request. `tool_name` may be absent except
    /// on the first chunk for a given `tool_call_id`; `arguments_delta`
    /// is concatenated across chunks that share an id.
    ApprovalRequestMessage {
        /// Which tool call this chunk belongs to.
        tool_call_id: ToolCallId,
        /// The tool name, present only on the first chunk.
        #[serde(default)]
        tool_name: Option<String>,
        /// The next slice of the arguments JSON string.
        arguments_delta: String,
    },
    /// The terminal status of the stream.
    StopReason {
        /// The runtime's wire value, e.g. `"end_turn"`,
        /// `"requires_approval"`.
        reason: String,
    },
}
