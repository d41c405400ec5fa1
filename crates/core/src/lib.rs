//! # Verdant Core
//!
//! Domain types, traits, and error definitions for the Verdant agent runtime.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external seam of the runtime is defined as a trait here: the reasoning
//! engine, retrieval augmentation, tools, and notification. Implementations live
//! in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Isolated testing with scripted/recording fakes
//! - Clean dependency graph (all crates depend inward on core)

pub mod directive;
pub mod engine;
pub mod error;
pub mod event;
pub mod notify;
pub mod retrieval;
pub mod tool;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use directive::Directive;
pub use engine::{EngineMessage, EngineReply, ReasoningEngine};
pub use error::{EngineError, Error, NotifyError, Result, RetrievalError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use notify::Notifier;
pub use retrieval::{RetrievalAugmenter, RetrievedDocument};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult, ToolStatus};
pub use turn::{Role, Session, SessionId, Turn};
