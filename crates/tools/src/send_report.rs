//! Send report tool — dispatch a report through the notification sink.
//!
//! The one built-in tool with a real side effect. Delivery failure becomes
//! an error-status result the model can react to, never a fault.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use verdant_core::error::ToolError;
use verdant_core::notify::Notifier;
use verdant_core::tool::{Tool, ToolResult};

pub struct SendReportTool {
    notifier: Arc<dyn Notifier>,
}

impl SendReportTool {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Tool for SendReportTool {
    fn name(&self) -> &str {
        "send_report"
    }

    fn description(&self) -> &str {
        "Send a report or notification to a recipient."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "to": { "type": "string", "description": "Recipient address" },
                "subject": { "type": "string", "description": "Report subject" },
                "body": { "type": "string", "description": "Report body" }
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn run(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let to = require_str(&arguments, "to")?;
        let subject = require_str(&arguments, "subject")?;
        let body = require_str(&arguments, "body")?;

        match self.notifier.notify(to, subject, body).await {
            Ok(()) => Ok(ToolResult::ok(
                "",
                format!("Report \"{subject}\" dispatched to {to}"),
            )),
            Err(e) => {
                warn!(recipient = to, error = %e, "Report delivery failed");
                Ok(ToolResult::error(
                    "",
                    format!("Delivery to {to} failed: {e}"),
                ))
            }
        }
    }
}

fn require_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_notify::RecordingNotifier;

    #[tokio::test]
    async fn dispatches_report() {
        let notifier = Arc::new(RecordingNotifier::new());
        let tool = SendReportTool::new(notifier.clone());

        let result = tool
            .run(serde_json::json!({
                "to": "ops@verdant.run",
                "subject": "Frost warning",
                "body": "Expected -2C overnight in the north blocks."
            }))
            .await
            .unwrap();

        assert!(!result.is_error());
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "Frost warning");
    }

    #[tokio::test]
    async fn delivery_failure_is_error_result() {
        let notifier = Arc::new(RecordingNotifier::new());
        notifier.set_failing(true);
        let tool = SendReportTool::new(notifier);

        let result = tool
            .run(serde_json::json!({
                "to": "ops@verdant.run",
                "subject": "s",
                "body": "b"
            }))
            .await
            .unwrap();

        assert!(result.is_error());
        assert!(result.output.contains("failed"));
    }

    #[tokio::test]
    async fn missing_field_is_invalid_arguments() {
        let tool = SendReportTool::new(Arc::new(RecordingNotifier::new()));
        let err = tool
            .run(serde_json::json!({"to": "ops@verdant.run"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
