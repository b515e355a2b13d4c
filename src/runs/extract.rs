//! Reply extraction from a completed run.
//!
//! Where the reply text lives depends on remote configuration the client does
//! not control, so extraction tries a fixed list of strategies in order and
//! takes the first non-empty match:
//!
//! 1. the run's messages: text of the most recent one
//! 2. `tool_resources.result.content` on the run object
//! 3. `last_messages` on the run object: `content` of the last entry
//! 4. `metadata.summary` on the run object
//!
//! The order is policy and must not change.

use serde_json::Value;
use tracing::debug;

use super::error::{Result, RunError};
use super::poller::RunResult;

type Strategy = fn(&RunResult) -> Option<String>;

const STRATEGIES: [(&str, Strategy); 4] = [
    ("messages", from_messages),
    ("tool_resources", from_tool_resources),
    ("last_messages", from_last_messages),
    ("metadata_summary", from_metadata_summary),
];

/// Extract the reply text of a completed run.
///
/// Never returns an empty string: when no strategy matches the result is
/// [`RunError::NoReplyFound`].
pub fn extract(result: &RunResult) -> Result<String> {
    STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            strategy(result).map(|reply| {
                debug!(name: "reply.extracted", run = %result.handle, strategy = *name, "Reply extracted");
                reply
            })
        })
        .ok_or(RunError::NoReplyFound)
}

fn from_messages(result: &RunResult) -> Option<String> {
    result.messages.last().and_then(|message| message.text())
}

fn from_tool_resources(result: &RunResult) -> Option<String> {
    result
        .run
        .field("tool_resources")
        .and_then(|v| v.pointer("/result/content"))
        .and_then(content_text)
}

fn from_last_messages(result: &RunResult) -> Option<String> {
    result
        .run
        .field("last_messages")
        .and_then(Value::as_array)
        .and_then(|entries| entries.last())
        .and_then(|entry| entry.get("content"))
        .and_then(content_text)
}

fn from_metadata_summary(result: &RunResult) -> Option<String> {
    result
        .run
        .field("metadata")
        .and_then(|v| v.get("summary"))
        .and_then(content_text)
}

/// Read a content field that is either a string or a list of typed parts.
///
/// Parts may be plain strings, `{"type": "text", "text": {"value": ..}}`,
/// or `{"type": "text", "text": ".."}`.
fn content_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(part_text)
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => return None,
    };

    (!text.trim().is_empty()).then_some(text)
}

fn part_text(part: &Value) -> Option<String> {
    match part {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => part
            .pointer("/text/value")
            .or_else(|| part.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
