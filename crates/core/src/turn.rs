//! Turn and Session domain types.
//!
//! These are the core value objects that flow through the runtime:
//! user input arrives → the agent loop appends turns → the engine reasons →
//! tools act → the final assistant turn closes the exchange.
//!
//! A `Session` is append-only for its lifetime. Turns are immutable once
//! pushed; history is never rewritten or rolled back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::tool::ToolCall;

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a turn in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (or a synthetic scheduler input)
    User,
    /// The agent's reasoning output
    Assistant,
    /// System instructions (directive)
    System,
    /// Tool execution result
    Tool,
}

/// A single turn in a session. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// A tool invocation requested by the assistant (at most one per turn)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn base(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_call: None,
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::base(Role::User, content)
    }

    /// Create a new assistant turn (plain text).
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::base(Role::Assistant, content)
    }

    /// Create an assistant turn that requests a tool invocation.
    pub fn assistant_tool_call(call: ToolCall) -> Self {
        let mut turn = Self::base(
            Role::Assistant,
            format!("[requesting tool: {}]", call.name),
        );
        turn.tool_call = Some(call);
        turn
    }

    /// Create a new system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::base(Role::System, content)
    }

    /// Create a tool result turn.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut turn = Self::base(Role::Tool, content);
        turn.tool_call_id = Some(tool_call_id.into());
        turn
    }
}

/// An ordered, append-only sequence of turns. Owned by exactly one agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,

    /// Ordered turns
    pub turns: Vec<Turn>,

    /// When this session was created
    pub created_at: DateTime<Utc>,

    /// When the last turn was appended
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new empty session.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn to the session.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    /// Append a tool result turn, enforcing the pairing invariant:
    /// a tool turn may only follow an assistant turn that carried the
    /// matching tool call.
    pub fn push_tool_result(
        &mut self,
        tool_call_id: &str,
        content: impl Into<String>,
    ) -> Result<(), Error> {
        let valid = self
            .turns
            .last()
            .and_then(|t| t.tool_call.as_ref().filter(|_| t.role == Role::Assistant))
            .is_some_and(|call| call.id == tool_call_id);

        if !valid {
            return Err(Error::Session(format!(
                "tool result {tool_call_id} has no matching preceding tool call"
            )));
        }

        self.push(Turn::tool_result(tool_call_id, content));
        Ok(())
    }

    /// Number of turns in the session.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recently appended turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
