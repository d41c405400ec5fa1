//! Deploy trigger tool — kick a frontend deployment for a named project.
//!
//! Stub implementation: returns a deterministic deployment id and URL.
//! Production deployments call the hosting provider's deploy API here.

use async_trait::async_trait;
use verdant_core::error::ToolError;
use verdant_core::tool::{Tool, ToolResult};

use crate::seed_hash;

pub struct DeployTriggerTool;

#[async_trait]
impl Tool for DeployTriggerTool {
    fn name(&self) -> &str {
        "deploy_trigger"
    }

    fn description(&self) -> &str {
        "Trigger a production deployment of a named frontend project."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "project": {
                    "type": "string",
                    "description": "The project name to deploy"
                }
            },
            "required": ["project"]
        })
    }

    async fn run(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let project = arguments["project"]
            .as_str()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'project' argument".into()))?;

        let hash = seed_hash(project);
        let deployment_id = format!("dpl_{hash:08x}");
        let url = format!("https://{project}.verdant.run");

        let data = serde_json::json!({
            "deployment_id": deployment_id,
            "project": project,
            "url": url,
            "state": "QUEUED",
        });

        Ok(ToolResult::ok(
            "",
            format!("Deployment {deployment_id} queued for {project} → {url}"),
        )
        .with_data(data))
    }
}
