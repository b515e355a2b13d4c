use std::time::Duration;

use thiserror::Error;

use super::status::RunStatus;
use crate::assistants::ApiError;

/// Failures of the submit / wait / extract pipeline.
#[derive(Error, Debug)]
pub enum RunError {
    /// The caller supplied no usable question or handle.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The remote run ended in a non-success terminal state.
    #[error("Run ended with status {0}")]
    RunFailed(RunStatus),

    /// The run was still not terminal when the wait budget ran out.
    #[error("Run still {last_status} after {}s", waited.as_secs())]
    Timeout {
        waited: Duration,
        last_status: RunStatus,
    },

    /// The run completed but none of the known result shapes carried a reply.
    #[error("Run completed without a recognisable reply")]
    NoReplyFound,

    /// Transport or API failure talking to the remote service.
    #[error("Assistant service unavailable: {0}")]
    RemoteUnavailable(#[from] ApiError),

    /// The wait was cancelled before the run finished.
    #[error("Wait cancelled before the run finished")]
    Cancelled,
}

/// Result type alias for run operations.
pub type Result<T> = std::result::Result<T, RunError>;
