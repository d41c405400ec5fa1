//! Scripted engine — deterministic test double for the reasoning seam.
//!
//! Replays a fixed queue of replies in order and records every message it
//! receives, so tests can assert both the agent's behavior and exactly what
//! was sent into the reasoning seam. An exhausted script returns
//! `EngineError::Unavailable`, which doubles as the fixture for
//! engine-outage turns.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use verdant_core::engine::{EngineMessage, EngineReply, ReasoningEngine};
use verdant_core::error::EngineError;

/// A reasoning engine that replays a scripted sequence of replies.
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<Result<EngineReply, EngineError>>>,
    received: Mutex<Vec<EngineMessage>>,
}

impl ScriptedEngine {
    /// Create an engine with no scripted replies (every send fails).
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Script a successful reply.
    pub fn push_reply(&self, reply: EngineReply) {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .push_back(Ok(reply));
    }

    /// Script a failure.
    pub fn push_error(&self, error: EngineError) {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .push_back(Err(error));
    }

    /// Everything this engine has received, in order.
    pub fn received(&self) -> Vec<EngineMessage> {
        self.received
            .lock()
            .expect("received lock poisoned")
            .clone()
    }

    /// How many sends have been made.
    pub fn send_count(&self) -> usize {
        self.received.lock().expect("received lock poisoned").len()
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, message: EngineMessage) -> Result<EngineReply, EngineError> {
        self.received
            .lock()
            .expect("received lock poisoned")
            .push(message);

        self.replies
            .lock()
            .expect("replies lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::Unavailable("script exhausted".into())))
    }
}
