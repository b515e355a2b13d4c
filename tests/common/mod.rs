#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use assistant_gateway::assistants::error::Result as ApiResult;
use assistant_gateway::assistants::{
    ApiError, AssistantTool, AssistantsApi, MessageContent, MessageText, Run, Thread,
    ThreadMessage,
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::time::Instant;

/// Scripted stand-in for the remote Assistants API.
///
/// `retrieve_run` walks through the configured status list and then keeps
/// returning the last entry. Completed runs list the configured replies.
pub struct ScriptedAssistants {
    statuses: Mutex<VecDeque<String>>,
    run_fields: Map<String, Value>,
    replies: Vec<String>,
    known_runs: Mutex<HashSet<(String, String)>>,
    user_messages: Mutex<Vec<(String, String)>>,
    calls: Mutex<Vec<String>>,
    poll_times: Mutex<Vec<Instant>>,
    tools: Mutex<Vec<AssistantTool>>,
    next_id: AtomicUsize,
}

impl ScriptedAssistants {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statuses: Mutex::new(statuses.into_iter().map(Into::into).collect()),
            run_fields: Map::new(),
            replies: Vec::new(),
            known_runs: Mutex::new(HashSet::new()),
            user_messages: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            poll_times: Mutex::new(Vec::new()),
            tools: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Assistant messages the completed run produces, oldest first.
    pub fn with_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies = replies.into_iter().map(Into::into).collect();
        self
    }

    /// Extra fields on every returned run object.
    pub fn with_run_fields(mut self, fields: Value) -> Self {
        if let Value::Object(map) = fields {
            self.run_fields = map;
        }
        self
    }

    /// Make a run retrievable without submitting it first.
    pub fn with_known_run(self, thread_id: &str, run_id: &str) -> Self {
        self.known_runs
            .lock()
            .unwrap()
            .insert((thread_id.to_string(), run_id.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.poll_times.lock().unwrap().len()
    }

    pub fn poll_times(&self) -> Vec<Instant> {
        self.poll_times.lock().unwrap().clone()
    }

    pub fn user_messages(&self) -> Vec<(String, String)> {
        self.user_messages.lock().unwrap().clone()
    }

    pub fn tools(&self) -> Vec<AssistantTool> {
        self.tools.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn run(&self, thread_id: &str, run_id: &str, status: &str) -> Run {
        Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status: status.to_string(),
            extra: self.run_fields.clone(),
        }
    }

    fn assistant_message(&self, run_id: &str, text: &str, idx: usize) -> ThreadMessage {
        ThreadMessage {
            id: format!("msg_reply_{idx}"),
            role: "assistant".into(),
            content: vec![MessageContent::Text {
                text: MessageText { value: text.into() },
            }],
            run_id: Some(run_id.into()),
            created_at: 0,
        }
    }
}

#[async_trait]
impl AssistantsApi for ScriptedAssistants {
    async fn create_thread(&self) -> ApiResult<Thread> {
        self.record("create_thread");
        Ok(Thread {
            id: self.next_id("thread"),
        })
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> ApiResult<ThreadMessage> {
        self.record(format!("create_message:{thread_id}"));
        self.user_messages
            .lock()
            .unwrap()
            .push((thread_id.to_string(), content.to_string()));
        Ok(ThreadMessage {
            id: self.next_id("msg"),
            role: "user".into(),
            content: vec![MessageContent::Text {
                text: MessageText {
                    value: content.into(),
                },
            }],
            run_id: None,
            created_at: 0,
        })
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> ApiResult<Run> {
        self.record(format!("create_run:{thread_id}:{assistant_id}"));
        let run_id = self.next_id("run");
        self.known_runs
            .lock()
            .unwrap()
            .insert((thread_id.to_string(), run_id.clone()));
        Ok(self.run(thread_id, &run_id, "queued"))
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> ApiResult<Run> {
        self.record(format!("retrieve_run:{thread_id}:{run_id}"));
        self.poll_times.lock().unwrap().push(Instant::now());

        let known = self
            .known_runs
            .lock()
            .unwrap()
            .contains(&(thread_id.to_string(), run_id.to_string()));
        if !known {
            return Err(ApiError::Api {
                status: 404,
                message: format!("No run found with id '{run_id}'."),
            });
        }

        let status = {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front().unwrap_or_default()
            } else {
                statuses.front().cloned().unwrap_or_else(|| "in_progress".into())
            }
        };
        Ok(self.run(thread_id, run_id, &status))
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        run_id: Option<&str>,
    ) -> ApiResult<Vec<ThreadMessage>> {
        self.record(format!("list_messages:{thread_id}:{}", run_id.unwrap_or("*")));

        let replies_for = |run: &str| {
            self.replies
                .iter()
                .enumerate()
                .map(|(idx, text)| self.assistant_message(run, text, idx))
                .collect::<Vec<_>>()
        };

        match run_id {
            Some(run) => Ok(replies_for(run)),
            None => {
                let mut out: Vec<ThreadMessage> = self
                    .user_messages
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|(t, _)| t == thread_id)
                    .enumerate()
                    .map(|(idx, (_, text))| ThreadMessage {
                        id: format!("msg_user_{idx}"),
                        role: "user".into(),
                        content: vec![MessageContent::Text {
                            text: MessageText {
                                value: text.clone(),
                            },
                        }],
                        run_id: None,
                        created_at: 0,
                    })
                    .collect();
                out.extend(replies_for("run_any"));
                Ok(out)
            }
        }
    }

    async fn update_assistant_tools(
        &self,
        assistant_id: &str,
        tools: &[AssistantTool],
    ) -> ApiResult<()> {
        self.record(format!("update_assistant_tools:{assistant_id}"));
        *self.tools.lock().unwrap() = tools.to_vec();
        Ok(())
    }
}

/// Run object fields with no recognisable reply.
pub fn empty_run_fields() -> Value {
    json!({ "metadata": {} })
}
