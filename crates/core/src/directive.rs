//! Directive — the agent's standing instructions and persona.
//!
//! The directive becomes the system prompt for every session. A built-in
//! default describes the field-operations persona; deployments can override
//! it wholesale from configuration.

use serde::{Deserialize, Serialize};

/// The agent's standing instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    /// The agent's name
    pub name: String,

    /// The full system prompt
    pub system_prompt: String,
}

impl Directive {
    /// The built-in default directive.
    pub fn default_directive() -> Self {
        Self {
            name: "Verdant".into(),
            system_prompt: Self::fallback_system_prompt(),
        }
    }

    /// Build a directive from an override prompt.
    pub fn with_override(prompt: impl Into<String>) -> Self {
        Self {
            name: "Verdant".into(),
            system_prompt: prompt.into(),
        }
    }

    fn fallback_system_prompt() -> String {
        concat!(
            "You are Verdant, an autonomous farm-operations agent. ",
            "You monitor fields, analyze warehouse and satellite data, and act ",
            "through the tools made available to you. ",
            "Work the cycle: perceive the provided context, reason about it, ",
            "act through at most one tool when it helps, then report. ",
            "Never invent data — query for it. Cite the source of every figure ",
            "you report. Be concise and operational.",
        )
        .into()
    }
}

impl Default for Directive {
    fn default() -> Self {
        Self::default_directive()
    }
}
