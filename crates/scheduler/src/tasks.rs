//! Built-in pulse tasks.
//!
//! Three tasks ship with the runtime: a per-pulse health probe, a
//! probability-gated commodity scan, and a cadence-gated executive brief.
//! Each is registered by the daemon with the policy named in its docs;
//! nothing here hard-codes a cadence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use verdant_agent::AgentLoop;
use verdant_core::error::Error;
use verdant_core::event::{DomainEvent, EventBus};
use verdant_core::notify::Notifier;
use verdant_core::tool::{ToolCall, ToolRegistry};
use verdant_tools::market_scan::TRACKED_COMMODITIES;

use crate::pulse::PulseTask;

/// Per-pulse health probe. Runs a synthetic status turn through the agent;
/// an error outcome fails the pulse and triggers backoff.
pub struct SelfDiagnosisTask {
    agent: Arc<Mutex<AgentLoop>>,
}

impl SelfDiagnosisTask {
    pub fn new(agent: Arc<Mutex<AgentLoop>>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl PulseTask for SelfDiagnosisTask {
    fn name(&self) -> &str {
        "self_diagnosis"
    }

    async fn run(&self, cycle: u64) -> Result<(), Error> {
        let mut agent = self.agent.lock().await;
        let outcome = agent.status_probe().await;
        match outcome.error {
            None => {
                debug!(cycle, "Self-diagnosis passed");
                Ok(())
            }
            Some(description) => Err(Error::Internal(format!(
                "self-diagnosis failed: {description}"
            ))),
        }
    }
}

/// Probability-gated commodity price scan. The commodity is chosen
/// deterministically from the cycle number; only the firing itself is
/// random.
pub struct MarketScanTask {
    tools: Arc<ToolRegistry>,
}

impl MarketScanTask {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// The commodity scanned on a given cycle. Rotates through the tracked
    /// list so repeated firings cover the whole portfolio.
    fn commodity_for(cycle: u64) -> &'static str {
        TRACKED_COMMODITIES[(cycle as usize) % TRACKED_COMMODITIES.len()]
    }
}

#[async_trait]
impl PulseTask for MarketScanTask {
    fn name(&self) -> &str {
        "market_scan"
    }

    async fn run(&self, cycle: u64) -> Result<(), Error> {
        let commodity = Self::commodity_for(cycle);
        let call = ToolCall {
            id: format!("pulse_{cycle}_market_scan"),
            name: "market_scan".into(),
            arguments: serde_json::json!({ "commodity": commodity }),
        };

        let result = self.tools.invoke(&call).await;
        if result.is_error() {
            return Err(Error::Internal(format!(
                "market scan for {commodity}: {}",
                result.output
            )));
        }
        info!(cycle, commodity, quote = %result.output, "Market scan complete");
        Ok(())
    }
}

/// Cadence-gated executive brief, delivered through the notifier.
pub struct DailyBriefTask {
    notifier: Arc<dyn Notifier>,
    event_bus: Arc<EventBus>,
    recipient: String,
    started_at: DateTime<Utc>,
}

impl DailyBriefTask {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        event_bus: Arc<EventBus>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            event_bus,
            recipient: recipient.into(),
            started_at: Utc::now(),
        }
    }

    fn compose(&self, cycle: u64) -> (String, String) {
        let uptime_hours = (Utc::now() - self.started_at).num_minutes() as f64 / 60.0;
        let subject = format!("Verdant executive brief — cycle {cycle}");
        let body = format!(
            "Pulse cycle: {cycle}\n\
             Uptime: {uptime_hours:.1} hours\n\
             All scheduled tasks are running on their normal cadence.\n",
        );
        (subject, body)
    }
}

#[async_trait]
impl PulseTask for DailyBriefTask {
    fn name(&self) -> &str {
        "daily_brief"
    }

    async fn run(&self, cycle: u64) -> Result<(), Error> {
        let (subject, body) = self.compose(cycle);
        self.notifier
            .notify(&self.recipient, &subject, &body)
            .await?;

        info!(cycle, recipient = %self.recipient, "Executive brief dispatched");
        self.event_bus.publish(DomainEvent::BriefDispatched {
            recipient: self.recipient.clone(),
            sequence: cycle,
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::directive::Directive;
    use verdant_core::engine::EngineReply;
    use verdant_core::error::EngineError;
    use verdant_engine::ScriptedEngine;
    use verdant_notify::RecordingNotifier;
    use verdant_retrieval::NoopRetriever;

    fn agent_with(engine: Arc<ScriptedEngine>) -> Arc<Mutex<AgentLoop>> {
        Arc::new(Mutex::new(AgentLoop::new(
            engine,
            Arc::new(NoopRetriever),
            Arc::new(ToolRegistry::new()),
            Arc::new(EventBus::default()),
            Directive::default(),
        )))
    }

    #[tokio::test]
    async fn self_diagnosis_passes_on_healthy_agent() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::Text("All systems operational.".into()));

        let task = SelfDiagnosisTask::new(agent_with(engine));
        task.run(1).await.unwrap();
    }

    #[tokio::test]
    async fn self_diagnosis_fails_when_engine_is_down() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.push_error(EngineError::Unavailable("backend down".into()));

        let task = SelfDiagnosisTask::new(agent_with(engine));
        let err = task.run(1).await.unwrap_err();
        assert!(err.to_string().contains("self-diagnosis failed"));
    }

    #[test]
    fn scan_rotation_covers_the_tracked_portfolio() {
        let n = TRACKED_COMMODITIES.len() as u64;
        for offset in 0..n {
            assert_eq!(
                MarketScanTask::commodity_for(offset),
                MarketScanTask::commodity_for(offset + n)
            );
        }
        // Consecutive cycles hit consecutive commodities
        assert_ne!(
            MarketScanTask::commodity_for(1),
            MarketScanTask::commodity_for(2)
        );
    }

    #[tokio::test]
    async fn market_scan_invokes_the_registered_tool() {
        let notifier: Arc<dyn Notifier> = Arc::new(RecordingNotifier::new());
        let tools = Arc::new(verdant_tools::default_registry(notifier).unwrap());
        let task = MarketScanTask::new(tools);

        task.run(1).await.unwrap();
        task.run(5).await.unwrap();
    }

    #[tokio::test]
    async fn market_scan_without_tool_is_an_error() {
        let task = MarketScanTask::new(Arc::new(ToolRegistry::new()));
        let err = task.run(1).await.unwrap_err();
        assert!(err.to_string().contains("market scan"));
    }

    #[tokio::test]
    async fn brief_goes_through_the_notifier() {
        let notifier = Arc::new(RecordingNotifier::new());
        let bus = Arc::new(EventBus::default());
        let mut events = bus.subscribe();
        let task = DailyBriefTask::new(notifier.clone(), bus, "ops@verdant.run");

        task.run(144).await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ops@verdant.run");
        assert!(sent[0].1.contains("cycle 144"));
        assert!(sent[0].2.contains("Pulse cycle: 144"));

        assert!(matches!(
            events.recv().await.unwrap().as_ref(),
            DomainEvent::BriefDispatched { sequence: 144, .. }
        ));
    }

    #[tokio::test]
    async fn brief_delivery_failure_is_an_error() {
        let notifier = Arc::new(RecordingNotifier::new());
        notifier.set_failing(true);
        let task = DailyBriefTask::new(
            notifier,
            Arc::new(EventBus::default()),
            "ops@verdant.run",
        );

        assert!(task.run(144).await.is_err());
    }
}
