//! Recording notifier — test double for the notification seam.

use async_trait::async_trait;
use std::sync::Mutex;

use verdant_core::error::NotifyError;
use verdant_core::notify::Notifier;

/// Captures every delivery; optionally fails on demand.
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    /// Make subsequent deliveries fail.
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().expect("fail lock poisoned") = failing;
    }

    /// All captured `(recipient, subject, body)` tuples, in order.
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().expect("sent lock poisoned").clone()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if *self.fail.lock().expect("fail lock poisoned") {
            return Err(NotifyError::DeliveryFailed {
                recipient: recipient.into(),
                reason: "recording notifier set to fail".into(),
            });
        }
        self.sent
            .lock()
            .expect("sent lock poisoned")
            .push((recipient.into(), subject.into(), body.into()));
        Ok(())
    }
}
