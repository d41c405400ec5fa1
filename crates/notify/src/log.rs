//! Log notifier — deliveries go to tracing, nowhere else.
//!
//! The development default. Keeps a bounded ring of recent deliveries so
//! embedders can inspect what would have been sent.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::info;

use verdant_core::error::NotifyError;
use verdant_core::notify::Notifier;

const RING_CAPACITY: usize = 32;

/// A delivery captured by the log notifier.
#[derive(Debug, Clone)]
pub struct LoggedDelivery {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// A notifier that logs deliveries instead of sending them.
pub struct LogNotifier {
    recent: Mutex<VecDeque<LoggedDelivery>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self {
            recent: Mutex::new(VecDeque::with_capacity(RING_CAPACITY)),
        }
    }

    /// Recent deliveries, oldest first.
    pub fn recent(&self) -> Vec<LoggedDelivery> {
        self.recent
            .lock()
            .expect("recent lock poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        info!(recipient, subject, body_len = body.len(), "Notification (log mode)");

        let mut recent = self.recent.lock().expect("recent lock poisoned");
        if recent.len() == RING_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(LoggedDelivery {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
        });
        Ok(())
    }
}
