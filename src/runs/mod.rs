//! Run orchestration: submit a question, wait for the run, extract the reply.
//!
//! # Architecture
//!
//! - [`submitter`]: registers a user message and starts a run
//! - [`poller`]: observes a run until it reaches a terminal status
//! - [`wait`]: the cancellable timed wait the poller is built on
//! - [`extract`]: turns a completed run into reply text
//! - [`RunService`]: the facade the HTTP layer and CLI use
//!
//! # Example
//!
//! ```rust,ignore
//! let service = RunService::new(api, "asst_123", PollPolicy::new(timeout, interval), status_wait);
//! let cancel = CancellationToken::new();
//! let answer = service.ask(None, "What is our runway?", &cancel).await?;
//! ```

pub mod error;
pub mod extract;
pub mod handle;
pub mod poller;
pub mod status;
pub mod submitter;
pub mod wait;

pub use error::RunError;
pub use handle::{ConversationHandle, RunHandle};
pub use poller::RunResult;
pub use status::RunStatus;
pub use submitter::Submission;
pub use wait::PollPolicy;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::assistants::{ApiError, AssistantTool, AssistantsApi, OpenAiAssistants};
use crate::config::AppConfig;

/// A reply together with the run that produced it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub handle: RunHandle,
    pub text: String,
}

/// One entry of a thread transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: String,
    pub content: String,
}

/// Submits questions to the configured assistant and waits for replies.
///
/// Built once at startup and shared by reference; holds no per-request state.
#[derive(Clone)]
pub struct RunService {
    api: Arc<dyn AssistantsApi>,
    assistant_id: String,
    policy: PollPolicy,
    status_wait: Duration,
}

impl std::fmt::Debug for RunService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunService")
            .field("assistant_id", &self.assistant_id)
            .field("policy", &self.policy)
            .field("status_wait", &self.status_wait)
            .finish_non_exhaustive()
    }
}

impl RunService {
    pub fn new(
        api: Arc<dyn AssistantsApi>,
        assistant_id: impl Into<String>,
        policy: PollPolicy,
        status_wait: Duration,
    ) -> Self {
        Self {
            api,
            assistant_id: assistant_id.into(),
            policy,
            status_wait,
        }
    }

    /// Build a service talking to the real API as configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let api = OpenAiAssistants::new(
            &config.assistant.base_url,
            config.assistant.api_key.clone(),
            config.assistant.request_timeout(),
        )?;
        Ok(Self::new(
            Arc::new(api),
            config.assistant.assistant_id.clone(),
            PollPolicy::new(config.polling.timeout(), config.polling.interval()),
            config.polling.status_wait(),
        ))
    }

    /// Start a run for `question`, creating a thread when none is given.
    pub async fn submit(
        &self,
        thread: Option<ConversationHandle>,
        question: &str,
    ) -> error::Result<Submission> {
        submitter::submit(self.api.as_ref(), &self.assistant_id, thread, question).await
    }

    /// Wait for a run using the full polling budget.
    pub async fn await_completion(
        &self,
        handle: &RunHandle,
        cancel: &CancellationToken,
    ) -> error::Result<RunResult> {
        poller::await_completion(self.api.as_ref(), handle, self.policy, cancel).await
    }

    /// One bounded wait on a previously started run, then extraction.
    ///
    /// With a zero status wait this is a single non-blocking probe.
    pub async fn probe(
        &self,
        handle: &RunHandle,
        cancel: &CancellationToken,
    ) -> error::Result<String> {
        let policy = self.policy.with_timeout(self.status_wait);
        let result = poller::await_completion(self.api.as_ref(), handle, policy, cancel).await?;
        extract::extract(&result)
    }

    /// Submit, wait and extract in one call.
    pub async fn ask(
        &self,
        thread: Option<ConversationHandle>,
        question: &str,
        cancel: &CancellationToken,
    ) -> error::Result<Answer> {
        let submission = self.submit(thread, question).await?;
        let result = self.await_completion(&submission.handle, cancel).await?;
        let text = extract::extract(&result)?;
        Ok(Answer {
            handle: submission.handle,
            text,
        })
    }

    /// All messages of a thread, oldest first. Non-text messages are skipped.
    pub async fn transcript(
        &self,
        thread: &ConversationHandle,
    ) -> error::Result<Vec<TranscriptEntry>> {
        let messages = self.api.list_messages(thread.as_str(), None).await?;
        Ok(messages
            .into_iter()
            .filter_map(|m| {
                let content = m.text()?;
                Some(TranscriptEntry {
                    role: m.role,
                    content,
                })
            })
            .collect())
    }

    /// Replace the assistant's tool list with the given tool types.
    pub async fn sync_tools(&self, tools: &[String]) -> error::Result<()> {
        let tools: Vec<AssistantTool> = tools
            .iter()
            .map(|kind| AssistantTool { kind: kind.clone() })
            .collect();
        self.api
            .update_assistant_tools(&self.assistant_id, &tools)
            .await?;
        info!(
            name: "assistant.tools.synced",
            assistant_id = %self.assistant_id,
            tools = ?tools.iter().map(|t| t.kind.as_str()).collect::<Vec<_>>(),
            "Assistant tools updated"
        );
        Ok(())
    }
}
