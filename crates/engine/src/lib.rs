//! Reasoning engine implementations for Verdant.
//!
//! - [`HttpEngine`] — OpenAI-compatible chat-completions client with function
//!   calling; works with OpenRouter, OpenAI, Ollama, vLLM and friends.
//! - [`ScriptedEngine`] — deterministic test double that replays a queue of
//!   replies and records everything it receives.

pub mod http;
pub mod scripted;

pub use http::{HttpEngine, HttpEngineConfig};
pub use scripted::ScriptedEngine;
