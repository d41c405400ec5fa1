//! Warehouse query tool — analytics SQL against the farm data warehouse.
//!
//! Stub implementation: recognizes the operation's core tables and returns
//! deterministic rows. Only read statements are accepted; the warehouse is
//! an analytics store and the agent has no business mutating it.

use async_trait::async_trait;
use verdant_core::error::ToolError;
use verdant_core::tool::{Tool, ToolResult};

use crate::seed_hash;

const KNOWN_TABLES: &[&str] = &["yield_history", "soil_readings", "irrigation_log"];

pub struct WarehouseQueryTool {
    dataset: String,
}

impl WarehouseQueryTool {
    pub fn new() -> Self {
        Self {
            dataset: "agri_operations".into(),
        }
    }
}

impl Default for WarehouseQueryTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WarehouseQueryTool {
    fn name(&self) -> &str {
        "warehouse_query"
    }

    fn description(&self) -> &str {
        "Run a read-only SQL query against the farm data warehouse (tables: yield_history, soil_readings, irrigation_log)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "sql": {
                    "type": "string",
                    "description": "The SQL SELECT statement to execute"
                }
            },
            "required": ["sql"]
        })
    }

    async fn run(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let sql = arguments["sql"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'sql' argument".into()))?;

        let normalized = sql.trim().to_lowercase();
        if !normalized.starts_with("select") {
            return Err(ToolError::InvalidArguments(
                "Only SELECT statements are allowed against the warehouse".into(),
            ));
        }

        let Some(table) = KNOWN_TABLES.iter().find(|t| normalized.contains(**t)) else {
            return Ok(ToolResult::error(
                "",
                format!(
                    "Query references no known table; available tables: {}",
                    KNOWN_TABLES.join(", ")
                ),
            ));
        };

        let rows = mock_rows(table, sql);
        let output = serde_json::to_string_pretty(&rows).unwrap_or_default();

        Ok(ToolResult::ok("", output).with_data(serde_json::json!({
            "dataset": self.dataset,
            "table": table,
            "row_count": rows.len(),
            "rows": rows,
        })))
    }
}

/// Deterministic result rows seeded by the query text.
fn mock_rows(table: &str, sql: &str) -> Vec<serde_json::Value> {
    let hash = seed_hash(sql);
    let count = 2 + (hash % 3) as usize;

    (0..count)
        .map(|i| {
            let row_seed = hash.wrapping_add(i as u32 * 7919);
            match table {
                "yield_history" => serde_json::json!({
                    "season": 2022 + (i as i32),
                    "block": format!("block_{}", 1 + row_seed % 12),
                    "yield_t_per_ha": 3.0 + (row_seed % 50) as f64 / 10.0,
                }),
                "soil_readings" => serde_json::json!({
                    "block": format!("block_{}", 1 + row_seed % 12),
                    "moisture_pct": 12 + row_seed % 28,
                    "ph": 5.5 + (row_seed % 25) as f64 / 10.0,
                }),
                _ => serde_json::json!({
                    "valve": 1 + row_seed % 24,
                    "minutes": 10 + row_seed % 110,
                    "status": if row_seed % 5 == 0 { "fault" } else { "ok" },
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn select_on_known_table_returns_rows() {
        let tool = WarehouseQueryTool::new();
        let result = tool
            .run(serde_json::json!({"sql": "SELECT * FROM yield_history WHERE season = 2024"}))
            .await
            .unwrap();

        assert!(!result.is_error());
        assert!(result.output.contains("yield_t_per_ha"));
        let data = result.data.unwrap();
        assert_eq!(data["table"], "yield_history");
        assert!(data["row_count"].as_u64().unwrap() >= 2);
    }

    #[tokio::test]
    async fn rejects_mutating_statements() {
        let tool = WarehouseQueryTool::new();
        let err = tool
            .run(serde_json::json!({"sql": "DELETE FROM soil_readings"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn unknown_table_is_error_result_not_fault() {
        let tool = WarehouseQueryTool::new();
        let result = tool
            .run(serde_json::json!({"sql": "SELECT * FROM secrets"}))
            .await
            .unwrap();
        assert!(result.is_error());
        assert!(result.output.contains("available tables"));
    }

    #[tokio::test]
    async fn missing_sql_is_invalid_arguments() {
        let tool = WarehouseQueryTool::new();
        let err = tool.run(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn deterministic_results() {
        let tool = WarehouseQueryTool::new();
        let args = serde_json::json!({"sql": "SELECT * FROM soil_readings"});
        let a = tool.run(args.clone()).await.unwrap();
        let b = tool.run(args).await.unwrap();
        assert_eq!(a.output, b.output);
    }
}
