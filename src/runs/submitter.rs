use tracing::info;

use super::error::{Result, RunError};
use super::handle::{ConversationHandle, RunHandle};
use super::status::RunStatus;
use crate::assistants::AssistantsApi;

/// A freshly started run and the status the remote reported at creation.
#[derive(Debug, Clone)]
pub struct Submission {
    pub handle: RunHandle,
    pub status: RunStatus,
}

/// Register `utterance` on a thread and start a run of `assistant_id`.
///
/// A new thread is created when `thread` is `None`. An empty or
/// whitespace-only utterance is rejected before any remote call.
pub async fn submit(
    api: &dyn AssistantsApi,
    assistant_id: &str,
    thread: Option<ConversationHandle>,
    utterance: &str,
) -> Result<Submission> {
    if utterance.trim().is_empty() {
        return Err(RunError::InvalidInput("question must not be empty".into()));
    }

    let thread = match thread {
        Some(thread) => thread,
        None => {
            let created = api.create_thread().await?;
            info!(name: "thread.created", thread_id = %created.id, "Thread created");
            ConversationHandle::new(created.id)
        }
    };

    api.create_message(thread.as_str(), utterance).await?;
    let run = api.create_run(thread.as_str(), assistant_id).await?;
    let status = RunStatus::from_remote(&run.status);

    info!(
        name: "run.submitted",
        thread_id = %thread,
        run_id = %run.id,
        status = %status,
        "Run submitted"
    );

    Ok(Submission {
        handle: RunHandle::new(thread, run.id),
        status,
    })
}
