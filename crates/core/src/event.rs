//! Domain event system — decoupled observability between components.
//!
//! Events are published when something interesting happens in the runtime.
//! Subscribers (telemetry, tests) react without coupling to the publishers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A turn finished (successfully or with an error outcome)
    TurnCompleted {
        session_id: String,
        success: bool,
        tool_used: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A tool was invoked through the registry
    ToolInvoked {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Retrieval failed and the turn proceeded with empty context
    RetrievalDegraded {
        query_preview: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A scheduler pulse finished
    PulseCompleted {
        sequence: u64,
        failed: bool,
        timestamp: DateTime<Utc>,
    },

    /// A pulse sub-task raised and was contained
    PulseTaskFailed {
        task_name: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A scheduled brief was handed to the notifier
    BriefDispatched {
        recipient: String,
        sequence: u64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Publishing with
/// zero subscribers is a no-op, never an error.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
