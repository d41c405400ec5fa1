//! Notifier trait — outbound report delivery.
//!
//! Scheduled report tasks hand their output to a Notifier. Delivery failures
//! are logged by the caller and never fatal to the scheduler.

use async_trait::async_trait;

use crate::error::NotifyError;

/// An abstract notification sink.
///
/// Implementations: tracing-backed log notifier (default), HTTP mail API,
/// recording fake for tests.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The notifier name (e.g., "log", "http").
    fn name(&self) -> &str;

    /// Deliver a message to a recipient.
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError>;
}
