use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a remote conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHandle(String);

impl ConversationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitted run: the thread it runs on plus the run id.
///
/// Serializes as `{"thread_id": "...", "run_id": "..."}` so callers of the
/// split start/status endpoints can hand it back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunHandle {
    pub thread_id: ConversationHandle,
    pub run_id: String,
}

impl RunHandle {
    pub fn new(thread_id: ConversationHandle, run_id: impl Into<String>) -> Self {
        Self {
            thread_id,
            run_id: run_id.into(),
        }
    }

    pub fn thread(&self) -> &ConversationHandle {
        &self.thread_id
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

impl fmt::Display for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.thread_id, self.run_id)
    }
}
