//! Wire types for the Assistants API (v2).
//!
//! Only the fields this crate reads are modelled explicitly. Runs keep every
//! other field in [`Run::extra`] because reply extraction has to look at
//! result shapes that differ between API versions and assistant setups.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Threads
// =============================================================================

/// A remote conversation thread.
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    /// Thread identifier (`thread_...`).
    pub id: String,
}

// =============================================================================
// Messages
// =============================================================================

/// Request body for `POST /threads/{thread_id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest<'a> {
    /// Author role. Always `user` for messages created by this client.
    pub role: &'a str,
    /// Plain-text message body.
    pub content: &'a str,
}

/// A message stored on a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Message identifier (`msg_...`).
    pub id: String,
    /// `user` or `assistant`.
    pub role: String,
    /// Content parts in the order the API returned them.
    #[serde(default)]
    pub content: Vec<MessageContent>,
    /// Run that produced the message, for assistant messages.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created_at: i64,
}

impl ThreadMessage {
    /// Text parts of the message joined with newlines.
    ///
    /// Returns `None` when the message has no non-empty text part.
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(text.value.as_str()),
                MessageContent::Other => None,
            })
            .filter(|value| !value.trim().is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

/// One content part of a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Text content.
    Text {
        /// The text payload.
        text: MessageText,
    },
    /// Image files, image URLs, refusals and anything newer.
    #[serde(other)]
    Other,
}

/// Text payload of a [`MessageContent::Text`] part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageText {
    /// The text itself.
    pub value: String,
}

/// A page of messages returned by `GET /threads/{thread_id}/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    /// Messages on this page.
    pub data: Vec<ThreadMessage>,
    /// Whether more pages follow.
    #[serde(default)]
    pub has_more: bool,
    /// Cursor for the next page.
    #[serde(default)]
    pub last_id: Option<String>,
}

// =============================================================================
// Runs
// =============================================================================

/// Request body for `POST /threads/{thread_id}/runs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest<'a> {
    /// Assistant to execute.
    pub assistant_id: &'a str,
}

/// A run as reported by the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier (`run_...`).
    pub id: String,
    /// Thread the run executes against.
    pub thread_id: String,
    /// Raw remote status string (`queued`, `in_progress`, `completed`, ...).
    pub status: String,
    /// Every other field of the run object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Run {
    /// Look up a raw field of the run object.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

// =============================================================================
// Assistants
// =============================================================================

/// A tool entry in an assistant's tool list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantTool {
    /// Tool type (`code_interpreter`, `file_search`, `function`, ...).
    #[serde(rename = "type")]
    pub kind: String,
}

/// Request body for `POST /assistants/{assistant_id}` when replacing tools.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateAssistantRequest {
    /// Full replacement tool list.
    pub tools: Vec<AssistantTool>,
}
