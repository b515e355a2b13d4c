//! Remote Assistants API access.
//!
//! The [`AssistantsApi`] trait is the only seam between this crate and the
//! vendor service. [`OpenAiAssistants`] talks to the real API over HTTP; tests
//! substitute scripted implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use assistant_gateway::assistants::{AssistantsApi, OpenAiAssistants};
//!
//! let api = OpenAiAssistants::new("https://api.openai.com/v1", "sk-...", Duration::from_secs(30))?;
//! let thread = api.create_thread().await?;
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::OpenAiAssistants;
pub use error::ApiError;
pub use types::{AssistantTool, MessageContent, MessageText, Run, Thread, ThreadMessage};

use async_trait::async_trait;

/// Operations of the remote Assistants API used by the gateway.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Create an empty conversation thread.
    async fn create_thread(&self) -> error::Result<Thread>;

    /// Append a `user` message to a thread.
    async fn create_message(&self, thread_id: &str, content: &str)
    -> error::Result<ThreadMessage>;

    /// Start a run of `assistant_id` against a thread.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> error::Result<Run>;

    /// Fetch the current state of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> error::Result<Run>;

    /// List messages of a thread in chronological order.
    ///
    /// With `run_id`, only messages produced by that run are returned.
    async fn list_messages(
        &self,
        thread_id: &str,
        run_id: Option<&str>,
    ) -> error::Result<Vec<ThreadMessage>>;

    /// Replace the tool list of an assistant.
    async fn update_assistant_tools(
        &self,
        assistant_id: &str,
        tools: &[AssistantTool],
    ) -> error::Result<()>;
}
