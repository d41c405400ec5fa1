//! The Verdant agent loop.
//!
//! One [`AgentLoop`] owns one [`Session`] and drives the turn state machine:
//! perceive (retrieve context), reason (engine call), optionally act (one
//! tool invocation), reason once more over the result, respond. Tool-calling
//! depth is capped at one invocation per turn — a policy, not an engine
//! limitation — so every turn terminates in a bounded number of external
//! calls.

mod loop_runner;
mod outcome;

pub use loop_runner::{AgentLoop, TurnPhase};
pub use outcome::{TurnOutcome, TurnStatus};
