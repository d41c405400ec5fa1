//! ReasoningEngine trait — the abstraction over conversational model sessions.
//!
//! An engine wraps one model session: it accepts either a composed prompt or a
//! structured tool-result message, and replies with either free text or a
//! single requested tool invocation. Implementations preserve conversational
//! history across `send` calls for the lifetime of the value, so one engine
//! value corresponds to one session. Callers serialize `send` per session; the
//! history is an ordered sequence and concurrent turns would interleave it.
//!
//! Implementations: HTTP chat-completions client, scripted test engine.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::tool::ToolCall;

/// A message sent into the reasoning engine.
#[derive(Debug, Clone)]
pub enum EngineMessage {
    /// A composed prompt (retrieved context + caller context + raw input).
    Prompt(String),

    /// The result of a tool invocation, fed back for one more reasoning pass.
    ToolResponse {
        /// The tool call this responds to
        call_id: String,
        /// The tool's name
        name: String,
        /// Result content (success payload or error description)
        content: String,
    },
}

impl EngineMessage {
    /// The textual content of this message, regardless of variant.
    pub fn content(&self) -> &str {
        match self {
            EngineMessage::Prompt(text) => text,
            EngineMessage::ToolResponse { content, .. } => content,
        }
    }
}

/// A reply from the reasoning engine — polymorphic over text and tool requests.
///
/// At most one tool call per reply. Engines that receive multi-call provider
/// replies truncate to the first call and log the rest.
#[derive(Debug, Clone)]
pub enum EngineReply {
    /// Free-text content — the turn is complete.
    Text(String),

    /// A single requested tool invocation.
    ToolCall(ToolCall),
}

impl EngineReply {
    pub fn is_tool_call(&self) -> bool {
        matches!(self, EngineReply::ToolCall(_))
    }
}

/// The core ReasoningEngine trait.
///
/// The agent loop calls `send` without knowing which backend is wired in —
/// pure polymorphism over the reasoning seam.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// A human-readable name for this engine (e.g., "http", "scripted").
    fn name(&self) -> &str;

    /// Send a message into the session and get the engine's reply.
    ///
    /// Implementations enforce their own bounded timeout and map transport
    /// failures to `EngineError`.
    async fn send(&self, message: EngineMessage) -> Result<EngineReply, EngineError>;

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> Result<bool, EngineError> {
        Ok(true)
    }
}
