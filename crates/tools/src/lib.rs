//! Built-in tool implementations for Verdant.
//!
//! Tools give the agent the ability to act on the operation:
//! query the farm data warehouse, inspect satellite tiles, trigger frontend
//! deployments, scan commodity markets, and dispatch reports.
//!
//! The warehouse/tile/deploy/market tools are deterministic stubs seeded by
//! their inputs: real side effects live behind HTTP APIs in production
//! deployments, and the stubs keep the full loop testable offline.

pub mod deploy_trigger;
pub mod market_scan;
pub mod satellite_tiles;
pub mod send_report;
pub mod warehouse_query;

use std::sync::Arc;

use verdant_core::error::ToolError;
use verdant_core::notify::Notifier;
use verdant_core::tool::ToolRegistry;

pub use deploy_trigger::DeployTriggerTool;
pub use market_scan::MarketScanTool;
pub use satellite_tiles::SatelliteTilesTool;
pub use send_report::SendReportTool;
pub use warehouse_query::WarehouseQueryTool;

/// Create the default tool registry with all built-in tools.
///
/// The report tool delivers through the injected notifier, so the same
/// registry works against the log sink in development and the mail API in
/// production.
pub fn default_registry(notifier: Arc<dyn Notifier>) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WarehouseQueryTool::new()))?;
    registry.register(Arc::new(SatelliteTilesTool))?;
    registry.register(Arc::new(DeployTriggerTool))?;
    registry.register(Arc::new(MarketScanTool))?;
    registry.register(Arc::new(SendReportTool::new(notifier)))?;
    Ok(registry)
}

/// Deterministic hash used by the stub tools to vary output by input.
pub(crate) fn seed_hash(input: &str) -> u32 {
    input
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32))
}
