//! Satellite tiles tool — NDVI statistics for a map tile.
//!
//! Stub implementation: validates `z/x/y` slippy-map coordinates and returns
//! a deterministic NDVI summary for the tile. Production deployments point
//! this at the tile service.

use async_trait::async_trait;
use verdant_core::error::ToolError;
use verdant_core::tool::{Tool, ToolResult};

use crate::seed_hash;

pub struct SatelliteTilesTool;

#[async_trait]
impl Tool for SatelliteTilesTool {
    fn name(&self) -> &str {
        "satellite_tiles"
    }

    fn description(&self) -> &str {
        "Fetch NDVI statistics for a satellite map tile at z/x/y coordinates."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "z": { "type": "integer", "description": "Zoom level (0-20)" },
                "x": { "type": "integer", "description": "Tile X coordinate" },
                "y": { "type": "integer", "description": "Tile Y coordinate" }
            },
            "required": ["z", "x", "y"]
        })
    }

    async fn run(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let z = require_coord(&arguments, "z")?;
        let x = require_coord(&arguments, "x")?;
        let y = require_coord(&arguments, "y")?;

        if z > 20 {
            return Err(ToolError::InvalidArguments(format!(
                "Zoom level {z} out of range (0-20)"
            )));
        }
        let max_index = (1u64 << z) - 1;
        if x > max_index || y > max_index {
            return Err(ToolError::InvalidArguments(format!(
                "Tile {x}/{y} out of range for zoom {z} (max {max_index})"
            )));
        }

        let stats = tile_stats(z, x, y);
        let output = serde_json::to_string_pretty(&stats).unwrap_or_default();
        Ok(ToolResult::ok("", output).with_data(stats))
    }
}

fn require_coord(arguments: &serde_json::Value, key: &str) -> Result<u64, ToolError> {
    arguments[key]
        .as_u64()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing or invalid '{key}' argument")))
}

/// Deterministic per-tile NDVI summary.
fn tile_stats(z: u64, x: u64, y: u64) -> serde_json::Value {
    let hash = seed_hash(&format!("{z}/{x}/{y}"));
    let mean = -0.1 + (hash % 90) as f64 / 100.0; // -0.1 to 0.8
    let spread = (hash % 20) as f64 / 100.0;

    serde_json::json!({
        "tile": format!("{z}/{x}/{y}"),
        "ndvi_mean": (mean * 1000.0).round() / 1000.0,
        "ndvi_min": ((mean - spread) * 1000.0).round() / 1000.0,
        "ndvi_max": ((mean + spread) * 1000.0).round() / 1000.0,
        "cloud_cover_pct": hash % 40,
        "acquired": "latest composite",
    })
}
