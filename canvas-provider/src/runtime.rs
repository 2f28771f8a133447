//! The `AgentRuntime` capability: the streaming `messages.create` protocol
//! consumed from the external agent runtime.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use layer0::{AgentId, CanvasError};

use crate::types::{Chunk, RuntimeInput, ToolDescriptor};

/// A boxed stream of chunks from one `messages.create` call. Each item is
/// `Err` only on a transport-level failure; a well-formed stream always
/// ends with a `Chunk::StopReason`.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk, CanvasError>> + Send>>;

/// The external agent runtime's streaming protocol. The orchestrator
/// never talks to an LLM directly; it opens a stream through this
/// trait, accumulates chunks, and re-enters with an `Approval` input
/// once it has executed the requested tools.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Open a streaming `messages.create` call against `agent_id`.
    /// `client_tools` is the permitted-tool set for this agent's kind;
    /// `input` is either the initial user message or an approval batch.
    async fn messages_create(
        &self,
        agent_id: &AgentId,
        input: Vec<RuntimeInput>,
        client_tools: Vec<ToolDescriptor>,
    ) -> Result<ChunkStream, CanvasError>;
}

/// A scripted [`AgentRuntime`] that replays a fixed sequence of chunk
/// batches, one batch per call to `messages_create`. Used by orchestrator
/// tests to drive specific approval-loop scenarios (a tool call followed
/// by `end_turn`, a transport failure, a stream that never terminates).
pub struct ScriptedAgentRuntime {
    batches: Mutex<VecDeque<Vec<Result<Chunk, CanvasError>>>>,
    /// Returned (and not consumed from `batches`) once the script is
    /// exhausted, so divergent-loop tests can script fewer batches than
    /// the configured iteration cap and still observe repetition.
    repeat_last: bool,
}

impl ScriptedAgentRuntime {
    /// Build a runtime that replays `batches` in order, one per call.
    pub fn new(batches: Vec<Vec<Result<Chunk, CanvasError>>>) -> Self {
        Self {
            batches: Mutex::new(batches.into_iter().collect()),
            repeat_last: false,
        }
    }

    /// Like [`ScriptedAgentRuntime::new`], but once `batches` is
    /// exhausted, the last batch is replayed forever instead of
    /// returning an error. Used to script a stream that never reports
    /// `end_turn`.
    pub fn repeating(batches: Vec<Vec<Result<Chunk, CanvasError>>>) -> Self {
        Self {
            batches: Mutex::new(batches.into_iter().collect()),
            repeat_last: true,
        }
    }
}

#[async_trait]
impl AgentRuntime for ScriptedAgentRuntime {
    async fn messages_create(
        &self,
        _agent_id: &AgentId,
        _input: Vec<RuntimeInput>,
        _client_tools: Vec<ToolDescriptor>,
    ) -> Result<ChunkStream, CanvasError> {
        let mut batches = self
            .batches
            .lock()
            .map_err(|_| CanvasError::Internal("scripted runtime lock poisoned".into()))?;
        let batch = if self.repeat_last {
            let next = batches.pop_front();
            match next {
                Some(b) => {
                    batches.push_back(b.iter().map(clone_chunk_result).collect());
                    batches.pop_back().unwrap()
                }
                None => return Err(CanvasError::AgentRuntimeUnavailable("script exhausted".into())),
            }
        } else {
            batches
                .pop_front()
                .ok_or_else(|| CanvasError::AgentRuntimeUnavailable("script exhausted".into()))?
        };
        Ok(Box::pin(stream::iter(batch)))
    }
}

fn clone_chunk_result(r: &Result<Chunk, CanvasError>) -> Result<Chunk, CanvasError> {
    match r {
        Ok(c) => Ok(c.clone()),
        Err(e) => Err(CanvasError::Internal(e.to_string())),
    }
}
