//! HTTP client for the OpenAI Assistants API (v2).

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::AssistantsApi;
use super::error::{ApiError, Result};
use super::types::{
    AssistantTool, CreateMessageRequest, CreateRunRequest, MessageList, Run, Thread,
    ThreadMessage, UpdateAssistantRequest,
};

/// Header opting into the v2 Assistants API.
const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Page size used when listing thread messages.
const MESSAGE_PAGE_SIZE: u32 = 100;

/// `reqwest`-backed implementation of [`AssistantsApi`].
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct OpenAiAssistants {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiAssistants {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root including the version segment (e.g. `https://api.openai.com/v1`)
    /// * `api_key` - Bearer credential
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, api_key, http)
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self> {
        // `Url::join` replaces the last segment unless the base ends with '/'.
        let mut base = base_url.as_ref().trim_end_matches('/').to_string();
        base.push('/');
        Ok(Self {
            base_url: Url::parse(&base)?,
            api_key: api_key.into(),
            http,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            })
        }
    }
}

/// Pull `error.message` out of an OpenAI error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl AssistantsApi for OpenAiAssistants {
    async fn create_thread(&self) -> Result<Thread> {
        let response = self
            .post(self.url("threads")?)
            .json(&json!({}))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        let req = CreateMessageRequest {
            role: "user",
            content,
        };
        let response = self
            .post(self.url(&format!("threads/{thread_id}/messages"))?)
            .json(&req)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let req = CreateRunRequest { assistant_id };
        let response = self
            .post(self.url(&format!("threads/{thread_id}/runs"))?)
            .json(&req)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let response = self
            .get(self.url(&format!("threads/{thread_id}/runs/{run_id}"))?)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        run_id: Option<&str>,
    ) -> Result<Vec<ThreadMessage>> {
        let url = self.url(&format!("threads/{thread_id}/messages"))?;
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("order", "asc".to_string()),
                ("limit", MESSAGE_PAGE_SIZE.to_string()),
            ];
            if let Some(run_id) = run_id {
                query.push(("run_id", run_id.to_string()));
            }
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let response = self.get(url.clone()).query(&query).send().await?;
            let page: MessageList = Self::handle_response(response).await?;
            messages.extend(page.data);

            match page.last_id {
                Some(last_id) if page.has_more => after = Some(last_id),
                _ => break,
            }
        }

        Ok(messages)
    }

    async fn update_assistant_tools(
        &self,
        assistant_id: &str,
        tools: &[AssistantTool],
    ) -> Result<()> {
        let req = UpdateAssistantRequest {
            tools: tools.to_vec(),
        };
        let response = self
            .post(self.url(&format!("assistants/{assistant_id}"))?)
            .json(&req)
            .send()
            .await?;
        let _: serde_json::Value = Self::handle_response(response).await?;
        Ok(())
    }
}
