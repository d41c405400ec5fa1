//! Turn outcome — the structured result every turn ends with.
//!
//! A turn never raises past the loop: irrecoverable faults (engine outage)
//! become an error-status outcome the caller can render or retry.

use serde::{Deserialize, Serialize};

/// Whether the turn produced a response or failed irrecoverably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Success,
    Error,
}

/// The result of one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub status: TurnStatus,

    /// The assistant's response (success only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Failure description (error only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TurnOutcome {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            status: TurnStatus::Success,
            response: Some(response.into()),
            error: None,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            status: TurnStatus::Error,
            response: None,
            error: Some(description.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TurnStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_outcome() {
        let outcome = TurnOutcome::success("All fields nominal.");
        assert!(outcome.is_success());
        assert_eq!(outcome.response.as_deref(), Some("All fields nominal."));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn error_outcome_serializes_without_response() {
        let outcome = TurnOutcome::error("engine unavailable");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("error"));
        assert!(!json.contains("response"));
    }
}
