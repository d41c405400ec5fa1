//! Market scan tool — commodity price check.
//!
//! Stub implementation: deterministic per-commodity quote and trend.
//! The scheduler's probability-gated task also drives this tool directly.

use async_trait::async_trait;
use verdant_core::error::ToolError;
use verdant_core::tool::{Tool, ToolResult};

use crate::seed_hash;

/// Commodities the operation tracks.
pub const TRACKED_COMMODITIES: &[&str] = &["dates", "olive oil", "wheat", "cotton"];

pub struct MarketScanTool;

#[async_trait]
impl Tool for MarketScanTool {
    fn name(&self) -> &str {
        "market_scan"
    }

    fn description(&self) -> &str {
        "Scan market pricing for an agricultural commodity. Returns a spot quote and short-term trend."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "commodity": {
                    "type": "string",
                    "description": "The commodity to scan (e.g., wheat, cotton, dates, olive oil)"
                }
            },
            "required": ["commodity"]
        })
    }

    async fn run(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let commodity = arguments["commodity"]
            .as_str()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'commodity' argument".into()))?;

        let quote = mock_quote(commodity);
        let output = serde_json::to_string_pretty(&quote).unwrap_or_default();
        Ok(ToolResult::ok("", output).with_data(quote))
    }
}

fn mock_quote(commodity: &str) -> serde_json::Value {
    let hash = seed_hash(&commodity.to_lowercase());
    let trends = ["rising", "falling", "flat"];

    serde_json::json!({
        "commodity": commodity,
        "spot_usd_per_tonne": 120 + hash % 600,
        "weekly_change_pct": ((hash % 120) as f64 - 60.0) / 10.0,
        "trend": trends[(hash as usize / 13) % trends.len()],
        "region": "MENA",
    })
}
