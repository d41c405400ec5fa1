//! Tool trait and registry — the uniform capability boundary.
//!
//! Tools are what let the agent act in the world: query the data warehouse,
//! fetch satellite tiles, trigger deployments, send reports. Every tool takes
//! a structured argument bag and produces a `ToolResult`. No tool fault —
//! error return, panic, or hang — crosses the registry boundary; the agent
//! loop always receives a result it can feed back to the model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::error::ToolError;

/// Default per-invocation wall-clock budget.
const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the engine's tool_call id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// Whether a tool invocation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Ok,
    Error,
}

/// The result of a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Outcome status
    pub status: ToolStatus,

    /// The output content (success payload or error description)
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    /// A successful result.
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            status: ToolStatus::Ok,
            output: output.into(),
            data: None,
        }
    }

    /// An error-status result. The error is content, not an exception.
    pub fn error(call_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            status: ToolStatus::Error,
            output: description.into(),
            data: None,
        }
    }

    /// Attach structured data.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Each capability (warehouse_query, satellite_tiles, deploy_trigger, ...)
/// implements this trait. Tools are registered in the ToolRegistry and made
/// available to the agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "warehouse_query").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn run(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the model
/// 2. Invoke tools when the model requests them
///
/// The registry is process-wide, constructed once at startup, and read-mostly
/// afterwards. `invoke` is safe for concurrent callers across sessions.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    invoke_timeout: Duration,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            invoke_timeout: DEFAULT_INVOKE_TIMEOUT,
        }
    }

    /// Set the per-invocation timeout.
    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = timeout;
        self
    }

    /// Register a tool. Duplicate names are rejected: registration is a
    /// startup-time act and a silent overwrite would hide wiring bugs.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Resolve a tool by name. Failures are not cached: a later resolve for
    /// the same name may succeed once the tool is registered.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// Get all tool definitions (for sending to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Invoke a tool call. This never fails from the caller's perspective:
    /// unknown tools, tool errors, panics, and timeouts all become
    /// error-status results the model can recover from.
    pub async fn invoke(&self, call: &ToolCall) -> ToolResult {
        let tool = match self.resolve(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = %call.name, "Requested tool is not registered");
                return ToolResult::error(&call.id, e.to_string());
            }
        };

        // Run on a spawned task so a panicking tool is contained by the
        // task boundary instead of unwinding through the agent loop.
        let arguments = call.arguments.clone();
        let handle = tokio::spawn(async move { tool.run(arguments).await });
        let abort_handle = handle.abort_handle();

        match tokio::time::timeout(self.invoke_timeout, handle).await {
            Ok(Ok(Ok(mut result))) => {
                result.call_id = call.id.clone();
                result
            }
            Ok(Ok(Err(e))) => {
                warn!(tool = %call.name, error = %e, "Tool returned an error");
                ToolResult::error(&call.id, e.to_string())
            }
            Ok(Err(join_err)) => {
                warn!(tool = %call.name, error = %join_err, "Tool task panicked");
                ToolResult::error(
                    &call.id,
                    ToolError::Panicked(format!("{}: {join_err}", call.name)).to_string(),
                )
            }
            Err(_) => {
                warn!(tool = %call.name, timeout_secs = self.invoke_timeout.as_secs(), "Tool timed out");
                // The deadline also bounds the tool's lifetime: abort the
                // task so a stuck tool cannot keep running (and producing
                // side effects) behind the caller's back.
                abort_handle.abort();
                ToolResult::error(
                    &call.id,
                    ToolError::Timeout {
                        tool_name: call.name.clone(),
                        timeout_secs: self.invoke_timeout.as_secs(),
                    }
                    .to_string(),
                )
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn run(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            let text = arguments["text"].as_str().unwrap_or("").to_string();
            Ok(ToolResult::ok("", text))
        }
    }

    /// A tool that always returns an error.
    struct FaultyTool;

    #[async_trait]
    impl Tool for FaultyTool {
        fn name(&self) -> &str {
            "faulty"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn run(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "faulty".into(),
                reason: "credentials expired".into(),
            })
        }
    }

    /// A tool that panics during execution.
    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        fn name(&self) -> &str {
            "panicking"
        }
        fn description(&self) -> &str {
            "Panics"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn run(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            panic!("internal invariant violated");
        }
    }

    /// A tool that never finishes.
    struct HangingTool;

    #[async_trait]
    impl Tool for HangingTool {
        fn name(&self) -> &str {
            "hanging"
        }
        fn description(&self) -> &str {
            "Never returns"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn run(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    fn call(name: &str) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: serde_json::json!({"text": "hello world"}),
        }
    }

    #[test]
    fn registry_register_and_resolve() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        assert!(registry.resolve("echo").is_ok());
        assert!(matches!(
            registry.resolve("nonexistent"),
            Err(ToolError::Unknown(_))
        ));
    }

    #[test]
    fn registry_rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let err = registry.register(Arc::new(EchoTool)).unwrap_err();
        assert!(matches!(err, ToolError::Duplicate(_)));
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let a = registry.resolve("echo").unwrap();
        let b = registry.resolve("echo").unwrap();
        assert_eq!(a.name(), b.name());
        assert_eq!(a.to_definition().parameters, b.to_definition().parameters);
    }

    #[test]
    fn registry_definitions() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }

    #[tokio::test]
    async fn invoke_successful_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();

        let result = registry.invoke(&call("echo")).await;
        assert_eq!(result.status, ToolStatus::Ok);
        assert_eq!(result.output, "hello world");
        assert_eq!(result.call_id, "call_1");
    }

    #[tokio::test]
    async fn invoke_unknown_tool_is_error_result() {
        let registry = ToolRegistry::new();
        let result = registry.invoke(&call("nonexistent")).await;
        assert!(result.is_error());
        assert!(result.output.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn invoke_converts_tool_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FaultyTool)).unwrap();

        let result = registry.invoke(&call("faulty")).await;
        assert!(result.is_error());
        assert!(result.output.contains("credentials expired"));
    }

    #[tokio::test]
    async fn invoke_contains_panics() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PanickingTool)).unwrap();

        let result = registry.invoke(&call("panicking")).await;
        assert!(result.is_error());
        assert!(result.output.contains("panicked"));
    }

    /// A tool that records a side effect after a long delay.
    struct SlowEffectTool {
        completions: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait]
    impl Tool for SlowEffectTool {
        fn name(&self) -> &str {
            "slow_effect"
        }
        fn description(&self) -> &str {
            "Finishes late"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn run(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            self.completions
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(ToolResult::ok("", "done"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn invoke_times_out_hanging_tool() {
        let mut registry =
            ToolRegistry::new().with_invoke_timeout(Duration::from_secs(1));
        registry.register(Arc::new(HangingTool)).unwrap();

        let result = registry.invoke(&call("hanging")).await;
        assert!(result.is_error());
        assert!(result.output.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_tool_is_aborted_not_detached() {
        let completions = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut registry = ToolRegistry::new().with_invoke_timeout(Duration::from_secs(1));
        registry
            .register(Arc::new(SlowEffectTool {
                completions: completions.clone(),
            }))
            .unwrap();

        let result = registry.invoke(&call("slow_effect")).await;
        assert!(result.is_error());

        // Give the tool's own deadline time to pass; the aborted task must
        // never reach its side effect.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(
            completions.load(std::sync::atomic::Ordering::SeqCst),
            0,
            "tool task must not keep running after its invocation timed out"
        );
    }
}
