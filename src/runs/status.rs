use std::fmt;

use serde::{Deserialize, Serialize};

/// Observed state of a remote run.
///
/// Transitions are owned by the remote service:
/// `Pending -> InProgress -> {Completed | Failed | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// Map a remote status string onto the local state set.
    ///
    /// Unknown values count as in progress so the poller keeps waiting and the
    /// timeout still applies.
    pub fn from_remote(status: &str) -> Self {
        match status {
            "queued" | "pending" => Self::Pending,
            "completed" => Self::Completed,
            "failed" | "expired" | "incomplete" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::InProgress,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
