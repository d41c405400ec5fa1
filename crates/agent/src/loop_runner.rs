//! The agent turn state machine.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use verdant_core::directive::Directive;
use verdant_core::engine::{EngineMessage, EngineReply, ReasoningEngine};
use verdant_core::event::{DomainEvent, EventBus};
use verdant_core::retrieval::{RetrievalAugmenter, RetrievedDocument};
use verdant_core::tool::{ToolCall, ToolRegistry};
use verdant_core::turn::{Session, Turn};

use crate::outcome::TurnOutcome;

/// The phases a turn moves through. Used in structured logs; the code path
/// is the authoritative transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Perceiving,
    Reasoning,
    Acting,
    ReasoningWithResult,
    Done,
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnPhase::Perceiving => "perceiving",
            TurnPhase::Reasoning => "reasoning",
            TurnPhase::Acting => "acting",
            TurnPhase::ReasoningWithResult => "reasoning_with_result",
            TurnPhase::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// The core agent loop. Owns its session exclusively; `&mut self` on
/// `handle_turn` makes concurrent turns against one session unrepresentable.
pub struct AgentLoop {
    engine: Arc<dyn ReasoningEngine>,
    retriever: Arc<dyn RetrievalAugmenter>,
    tools: Arc<ToolRegistry>,
    event_bus: Arc<EventBus>,
    directive: Directive,
    retrieval_k: usize,
    session: Session,
}

impl AgentLoop {
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        retriever: Arc<dyn RetrievalAugmenter>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
        directive: Directive,
    ) -> Self {
        Self {
            engine,
            retriever,
            tools,
            event_bus,
            directive,
            retrieval_k: 3,
            session: Session::new(),
        }
    }

    /// Set how many documents to retrieve per turn.
    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    /// Read access to the session history.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The directive in force for this loop.
    pub fn directive(&self) -> &Directive {
        &self.directive
    }

    /// Process one turn: perceive, reason, act at most once, respond.
    ///
    /// Never panics and never returns early with a raw error — every failure
    /// mode lands in a [`TurnOutcome`].
    pub async fn handle_turn(
        &mut self,
        input: &str,
        context: Option<serde_json::Value>,
    ) -> TurnOutcome {
        info!(
            session_id = %self.session.id,
            turns = self.session.len(),
            "Processing turn"
        );

        // ── PERCEIVING ──
        let documents = self.perceive(input).await;

        // ── REASONING ──
        debug!(phase = %TurnPhase::Reasoning, documents = documents.len(), "Composing prompt");
        let prompt = self.compose_prompt(input, &documents, context.as_ref());
        self.session.push(Turn::user(input));

        let reply = match self.engine.send(EngineMessage::Prompt(prompt)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Reasoning failed, turn aborted");
                return self.finish_error(e.to_string());
            }
        };

        let call = match reply {
            EngineReply::Text(text) => {
                self.session.push(Turn::assistant(&text));
                return self.finish_success(text, None);
            }
            EngineReply::ToolCall(call) => call,
        };

        // ── ACTING ──
        debug!(phase = %TurnPhase::Acting, tool = %call.name, "Invoking tool");
        self.session.push(Turn::assistant_tool_call(call.clone()));
        let result = self.act(&call).await;

        if self
            .session
            .push_tool_result(&call.id, &result.output)
            .is_err()
        {
            // Unreachable by construction: the assistant turn carrying the
            // call was appended just above.
            return self.finish_error("session ordering invariant violated");
        }

        // ── REASONING_WITH_RESULT ──
        debug!(phase = %TurnPhase::ReasoningWithResult, tool = %call.name, "Feeding result back");
        let followup = self
            .engine
            .send(EngineMessage::ToolResponse {
                call_id: call.id.clone(),
                name: call.name.clone(),
                content: result.output.clone(),
            })
            .await;

        let text = match followup {
            Ok(EngineReply::Text(text)) => text,
            Ok(EngineReply::ToolCall(second)) => {
                // Bounded-depth policy: one tool invocation per turn. A
                // second request is flattened into a flagged narrative so
                // the turn still terminates.
                warn!(
                    tool = %second.name,
                    "Engine requested a second tool call; depth is capped at one"
                );
                format!(
                    "[follow-up tool request '{}' was not executed: one tool invocation per turn] \
                     Result of '{}': {}",
                    second.name, call.name, result.output
                )
            }
            Err(e) => {
                warn!(error = %e, "Post-tool reasoning failed, turn aborted");
                return self.finish_error(e.to_string());
            }
        };

        self.session.push(Turn::assistant(&text));
        self.finish_success(text, Some(call.name))
    }

    /// A cheap synthetic turn used by the scheduler's diagnosis task.
    pub async fn status_probe(&mut self) -> TurnOutcome {
        self.handle_turn("Status report. Are all systems operational?", None)
            .await
    }

    async fn perceive(&self, input: &str) -> Vec<RetrievedDocument> {
        debug!(phase = %TurnPhase::Perceiving, k = self.retrieval_k, "Retrieving context");
        match self.retriever.search(input, self.retrieval_k).await {
            Ok(documents) => documents,
            Err(e) => {
                // Degraded, never fatal: reasoning proceeds without context.
                warn!(error = %e, "Retrieval failed, proceeding with empty context");
                self.event_bus.publish(DomainEvent::RetrievalDegraded {
                    query_preview: input.chars().take(80).collect(),
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                Vec::new()
            }
        }
    }

    async fn act(&self, call: &ToolCall) -> verdant_core::tool::ToolResult {
        let start = std::time::Instant::now();
        let result = self.tools.invoke(call).await;
        self.event_bus.publish(DomainEvent::ToolInvoked {
            tool_name: call.name.clone(),
            success: !result.is_error(),
            duration_ms: start.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });
        result
    }

    fn compose_prompt(
        &self,
        input: &str,
        documents: &[RetrievedDocument],
        context: Option<&serde_json::Value>,
    ) -> String {
        let mut prompt = String::new();

        if !documents.is_empty() {
            prompt.push_str("RELEVANT CONTEXT:\n");
            for doc in documents {
                prompt.push_str(&format!("{}. {}\n", doc.rank + 1, doc.content));
            }
            prompt.push('\n');
        }

        if let Some(context) = context {
            prompt.push_str(&format!("ADDITIONAL CONTEXT:\n{context}\n\n"));
        }

        prompt.push_str(&format!("INPUT: {input}"));
        prompt
    }

    fn finish_success(&self, text: String, tool_used: Option<String>) -> TurnOutcome {
        debug!(phase = %TurnPhase::Done, "Turn complete");
        self.event_bus.publish(DomainEvent::TurnCompleted {
            session_id: self.session.id.to_string(),
            success: true,
            tool_used,
            timestamp: Utc::now(),
        });
        TurnOutcome::success(text)
    }

    fn finish_error(&self, description: impl Into<String>) -> TurnOutcome {
        let description = description.into();
        debug!(phase = %TurnPhase::Done, error = %description, "Turn failed");
        self.event_bus.publish(DomainEvent::TurnCompleted {
            session_id: self.session.id.to_string(),
            success: false,
            tool_used: None,
            timestamp: Utc::now(),
        });
        TurnOutcome::error(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use verdant_core::error::{EngineError, ToolError};
    use verdant_core::tool::{Tool, ToolResult};
    use verdant_core::turn::Role;
    use verdant_engine::ScriptedEngine;
    use verdant_retrieval::{FailingRetriever, KeywordIndex, NoopRetriever};

    /// A tool that counts its invocations.
    struct CountingTool {
        invocations: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "field_probe"
        }
        fn description(&self) -> &str {
            "Probes a field"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn run(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Ok(ToolResult::ok("", "moisture 24%, temp 19C"))
        }
    }

    fn tool_call(name: &str) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: serde_json::json!({}),
        }
    }

    fn build_loop(
        engine: Arc<ScriptedEngine>,
        retriever: Arc<dyn RetrievalAugmenter>,
        tools: ToolRegistry,
    ) -> AgentLoop {
        AgentLoop::new(
            engine,
            retriever,
            Arc::new(tools),
            Arc::new(EventBus::default()),
            Directive::default(),
        )
    }

    #[tokio::test]
    async fn text_only_turn_appends_two_turns() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::Text("All systems operational.".into()));

        let mut agent = build_loop(engine, Arc::new(NoopRetriever), ToolRegistry::new());
        let outcome = agent.handle_turn("Status check", None).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.response.as_deref(), Some("All systems operational."));
        // user + assistant, no tool turn
        assert_eq!(agent.session().len(), 2);
        assert!(agent
            .session()
            .turns
            .iter()
            .all(|t| t.role != Role::Tool));
    }

    #[tokio::test]
    async fn tool_turn_appends_full_sequence() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(CountingTool {
                invocations: invocations.clone(),
            }))
            .unwrap();

        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::ToolCall(tool_call("field_probe")));
        engine.push_reply(EngineReply::Text(
            "Block 7 moisture is healthy at 24%.".into(),
        ));

        let mut agent = build_loop(engine.clone(), Arc::new(NoopRetriever), registry);
        let outcome = agent.handle_turn("Check block 7", None).await;

        assert!(outcome.is_success());
        // Final content is post-tool reasoning, not the raw payload
        assert_eq!(
            outcome.response.as_deref(),
            Some("Block 7 moisture is healthy at 24%.")
        );
        assert_eq!(invocations.load(Ordering::SeqCst), 1);

        let roles: Vec<Role> = agent.session().turns.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );

        // The engine saw the tool result on its second send
        let received = engine.received();
        assert_eq!(received.len(), 2);
        assert!(matches!(
            &received[1],
            EngineMessage::ToolResponse { name, .. } if name == "field_probe"
        ));
    }

    #[tokio::test]
    async fn unknown_tool_still_produces_response() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::ToolCall(tool_call("drone_commander")));
        engine.push_reply(EngineReply::Text(
            "I couldn't run that capability; it is not installed.".into(),
        ));

        let mut agent = build_loop(engine.clone(), Arc::new(NoopRetriever), ToolRegistry::new());
        let outcome = agent.handle_turn("Launch the drone", None).await;

        assert!(outcome.is_success());
        // The failure reached the engine as tool-result content
        let received = engine.received();
        assert!(received[1].content().contains("Unknown tool"));

        // Tool turn was still appended with the error content
        let tool_turn = agent
            .session()
            .turns
            .iter()
            .find(|t| t.role == Role::Tool)
            .unwrap();
        assert!(tool_turn.content.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn failing_retrieval_degrades_to_empty_context() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::Text("Working without context.".into()));

        let mut agent = build_loop(
            engine.clone(),
            Arc::new(FailingRetriever::default()),
            ToolRegistry::new(),
        );
        let outcome = agent.handle_turn("Summarize the season", None).await;

        assert!(outcome.is_success());
        // Prompt carries no context block
        let received = engine.received();
        assert!(!received[0].content().contains("RELEVANT CONTEXT"));
    }

    #[tokio::test]
    async fn retrieved_context_lands_in_prompt() {
        let index = KeywordIndex::new();
        index
            .add_document(
                "Block 7 shows declining NDVI over three passes",
                serde_json::Map::new(),
            )
            .await;

        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::Text("Noted.".into()));

        let mut agent = build_loop(engine.clone(), Arc::new(index), ToolRegistry::new());
        agent.handle_turn("What about NDVI in block 7?", None).await;

        let received = engine.received();
        assert!(received[0].content().contains("RELEVANT CONTEXT"));
        assert!(received[0].content().contains("declining NDVI"));
    }

    #[tokio::test]
    async fn caller_context_lands_in_prompt() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::Text("Noted.".into()));

        let mut agent = build_loop(engine.clone(), Arc::new(NoopRetriever), ToolRegistry::new());
        agent
            .handle_turn(
                "Assess frost risk",
                Some(serde_json::json!({"region": "north"})),
            )
            .await;

        let received = engine.received();
        assert!(received[0].content().contains("ADDITIONAL CONTEXT"));
        assert!(received[0].content().contains("north"));
    }

    #[tokio::test]
    async fn engine_outage_is_error_outcome() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.push_error(EngineError::Unavailable("backend down".into()));

        let mut agent = build_loop(engine, Arc::new(NoopRetriever), ToolRegistry::new());
        let outcome = agent.handle_turn("Anything", None).await;

        assert!(!outcome.is_success());
        assert!(outcome.error.unwrap().contains("backend down"));
    }

    #[tokio::test]
    async fn second_tool_request_is_flagged_not_executed() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(CountingTool {
                invocations: invocations.clone(),
            }))
            .unwrap();

        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::ToolCall(tool_call("field_probe")));
        engine.push_reply(EngineReply::ToolCall(ToolCall {
            id: "call_2".into(),
            name: "field_probe".into(),
            arguments: serde_json::json!({}),
        }));

        let mut agent = build_loop(engine.clone(), Arc::new(NoopRetriever), registry);
        let outcome = agent.handle_turn("Probe twice", None).await;

        // Turn terminates successfully with a flagged narrative; exactly one
        // invocation happened and the engine was not consulted a third time.
        assert!(outcome.is_success());
        assert!(outcome.response.unwrap().contains("was not executed"));
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert_eq!(engine.send_count(), 2);
    }

    #[tokio::test]
    async fn session_is_append_only_across_turns() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::Text("First.".into()));
        engine.push_reply(EngineReply::Text("Second.".into()));

        let mut agent = build_loop(engine, Arc::new(NoopRetriever), ToolRegistry::new());
        agent.handle_turn("one", None).await;
        let first_len = agent.session().len();
        agent.handle_turn("two", None).await;

        assert_eq!(agent.session().len(), first_len + 2);
        assert_eq!(agent.session().turns[0].content, "one");
    }

    #[tokio::test]
    async fn status_probe_is_a_normal_turn() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.push_reply(EngineReply::Text("Operational.".into()));

        let mut agent = build_loop(engine, Arc::new(NoopRetriever), ToolRegistry::new());
        let outcome = agent.status_probe().await;
        assert!(outcome.is_success());
        assert_eq!(agent.session().len(), 2);
    }
}
