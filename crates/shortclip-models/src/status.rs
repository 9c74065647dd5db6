//! Conversion request lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a conversion request.
///
/// Transitions are unrestricted: the external worker may move a request
/// between any two states, and the status-update handler does not reject
/// "invalid" transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ConversionStatus {
    /// Request created, waiting for a worker to pick it up
    #[default]
    Pending,
    /// A worker is actively converting the source video
    Processing,
    /// Conversion finished, result URLs available
    Completed,
    /// Conversion failed, error message available
    Failed,
}

impl ConversionStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStatus::Pending => "pending",
            ConversionStatus::Processing => "processing",
            ConversionStatus::Completed => "completed",
            ConversionStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversionStatus::Completed | ConversionStatus::Failed)
    }
}

impl std::fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
