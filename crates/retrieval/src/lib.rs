//! Retrieval augmentation backends for Verdant.
//!
//! - [`KeywordIndex`] — in-memory corpus with case-insensitive keyword
//!   scoring; the default for offline and single-process deployments.
//! - [`NoopRetriever`] — always returns an empty snapshot.
//! - [`Bounded`] — decorator that enforces a retrieval deadline.
//! - [`FailingRetriever`] — always errors; exists so consumers can prove
//!   their degraded-context behavior.

pub mod bounded;
pub mod failing;
pub mod keyword;
pub mod noop;

pub use bounded::Bounded;
pub use failing::FailingRetriever;
pub use keyword::KeywordIndex;
pub use noop::NoopRetriever;
