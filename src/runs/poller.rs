use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{Result, RunError};
use super::handle::RunHandle;
use super::status::RunStatus;
use super::wait::{PollPolicy, TimedWait, WaitStop};
use crate::assistants::{AssistantsApi, Run, ThreadMessage};

/// Everything known about a run once it completed.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub handle: RunHandle,
    pub status: RunStatus,
    /// The run object as last returned by the remote API.
    pub run: Run,
    /// Messages produced by the run, oldest first.
    pub messages: Vec<ThreadMessage>,
}

/// Poll a run until it reaches a terminal status.
///
/// The first probe goes out immediately, later ones one `policy.interval`
/// apart. A completed run has its messages listed and returned; failed or
/// cancelled runs, an exhausted budget and cancellation are errors.
pub async fn await_completion(
    api: &dyn AssistantsApi,
    handle: &RunHandle,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Result<RunResult> {
    let mut wait = TimedWait::start(policy, cancel);
    let mut last_status = RunStatus::Pending;

    loop {
        if let Err(stop) = wait.tick().await {
            return Err(stopped(handle, stop, last_status));
        }

        let run = wait
            .guard(api.retrieve_run(handle.thread().as_str(), handle.run_id()))
            .await
            .map_err(|stop| stopped(handle, stop, last_status))??;

        let status = RunStatus::from_remote(&run.status);
        debug!(
            name: "run.polled",
            run = %handle,
            poll = wait.ticks(),
            remote_status = %run.status,
            status = %status,
            "Run polled"
        );

        if !status.is_terminal() {
            last_status = status;
            continue;
        }

        if status != RunStatus::Completed {
            warn!(
                name: "run.failed",
                run = %handle,
                status = %status,
                last_error = ?run.field("last_error"),
                "Run ended without completing"
            );
            return Err(RunError::RunFailed(status));
        }

        let messages = wait
            .guard(api.list_messages(handle.thread().as_str(), Some(handle.run_id())))
            .await
            .map_err(|stop| stopped(handle, stop, status))??;

        info!(
            name: "run.completed",
            run = %handle,
            polls = wait.ticks(),
            elapsed_ms = wait.elapsed().as_millis() as u64,
            messages = messages.len(),
            "Run completed"
        );

        return Ok(RunResult {
            handle: handle.clone(),
            status,
            run,
            messages,
        });
    }
}

fn stopped(handle: &RunHandle, stop: WaitStop, last_status: RunStatus) -> RunError {
    match stop {
        WaitStop::Expired(waited) => {
            warn!(
                name: "run.timeout",
                run = %handle,
                waited_ms = waited.as_millis() as u64,
                status = %last_status,
                "Run wait timed out"
            );
            RunError::Timeout {
                waited,
                last_status,
            }
        }
        WaitStop::Cancelled => {
            info!(name: "run.wait.cancelled", run = %handle, "Run wait cancelled");
            RunError::Cancelled
        }
    }
}
