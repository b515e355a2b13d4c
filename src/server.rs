use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Query, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::rate_limit::rate_limit_middleware;
use crate::runs::{ConversationHandle, RunError, RunHandle, RunService, RunStatus};

/// Start the Axum server with the provided configuration.
///
/// Runs until Ctrl-C / SIGTERM; in-flight waits are cancelled and open
/// connections drained before returning.
pub async fn start_server(config: Arc<AppConfig>, runs: Arc<RunService>) -> anyhow::Result<()> {
    info!(
        name: "assistant.config.loaded",
        base_url = %config.assistant.base_url,
        assistant_id = %config.assistant.assistant_id,
        poll_timeout_secs = config.polling.timeout_secs,
        poll_interval_ms = config.polling.interval_ms,
        "Assistant configuration loaded"
    );

    if !config.assistant.tools.is_empty() {
        if let Err(e) = runs.sync_tools(&config.assistant.tools).await {
            warn!(name: "assistant.tools.sync_failed", error = %e, "Failed to update assistant tools");
        }
    }

    let shutdown = CancellationToken::new();
    let state = AppState::new(Arc::clone(&config), runs, shutdown.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Always applied; "disabled" is a one-year timeout so the layer stack keeps one type.
    let timeout_duration = state.config.resilience.request_timeout();

    Router::new()
        .route("/", get(health))
        .route("/ask", post(ask))
        .route("/start", post(start))
        .route("/status", get(status))
        .route("/messages", get(messages))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => error_response(
                        StatusCode::REQUEST_TIMEOUT,
                        "Request timed out".to_string(),
                        None,
                    ),
                }
            },
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(name: "server.signal.error", error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(name: "server.signal.error", error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(name: "server.shutdown", "Shutdown signal received");
    shutdown.cancel();
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    /// Last observed run status, when the error concerns a known run.
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<RunStatus>,
}

fn error_response(code: StatusCode, error: String, status: Option<RunStatus>) -> Response {
    (code, Json(ErrorBody { error, status })).into_response()
}

impl IntoResponse for RunError {
    fn into_response(self) -> Response {
        let (code, run_status) = match &self {
            RunError::InvalidInput(_) => (StatusCode::BAD_REQUEST, None),
            RunError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, None),
            RunError::RunFailed(status) => (StatusCode::INTERNAL_SERVER_ERROR, Some(*status)),
            RunError::Timeout { last_status, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Some(*last_status))
            }
            RunError::NoReplyFound | RunError::RemoteUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        if code.is_server_error() {
            error!(name: "http.request.failed", status = code.as_u16(), error = %self, "Request failed");
        }

        error_response(code, self.to_string(), run_status)
    }
}

/// Handler failure: either a run error or a request body axum refused.
#[derive(Debug)]
enum HandlerError {
    Run(RunError),
    Body(JsonRejection),
}

impl From<RunError> for HandlerError {
    fn from(err: RunError) -> Self {
        Self::Run(err)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            Self::Run(err) => err.into_response(),
            // Oversized bodies keep their 413; every other rejection is a bad request.
            Self::Body(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                error_response(rejection.status(), rejection.body_text(), None)
            }
            Self::Body(rejection) => {
                error_response(StatusCode::BAD_REQUEST, rejection.body_text(), None)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for `/ask` and `/start`.
#[derive(Debug, Deserialize)]
struct QuestionRequest {
    /// The user's question.
    #[serde(default)]
    question: Option<String>,
    /// Optional thread to continue (creates a new one if absent or empty).
    #[serde(default)]
    thread_id: Option<String>,
}

impl QuestionRequest {
    fn from_body(
        body: Result<Json<QuestionRequest>, JsonRejection>,
    ) -> Result<(String, Option<ConversationHandle>), HandlerError> {
        let Json(req) = body.map_err(HandlerError::Body)?;
        let question = req
            .question
            .ok_or_else(|| RunError::InvalidInput("missing 'question' field".into()))?;
        let thread = req
            .thread_id
            .filter(|id| !id.trim().is_empty())
            .map(ConversationHandle::new);
        Ok((question, thread))
    }
}

/// Response from `/ask`.
#[derive(Debug, Serialize)]
struct AskResponse {
    question: String,
    answer: String,
    thread_id: String,
    run_id: String,
}

/// Response from `/start`.
#[derive(Debug, Serialize)]
struct StartResponse {
    thread_id: String,
    run_id: String,
    status: RunStatus,
}

/// Query of `/status`.
#[derive(Debug, Deserialize)]
struct StatusQuery {
    thread_id: Option<String>,
    run_id: Option<String>,
}

impl StatusQuery {
    fn into_handle(self) -> Result<RunHandle, RunError> {
        match (non_empty(self.thread_id), non_empty(self.run_id)) {
            (Some(thread_id), Some(run_id)) => {
                Ok(RunHandle::new(ConversationHandle::new(thread_id), run_id))
            }
            _ => Err(RunError::InvalidInput(
                "both 'thread_id' and 'run_id' are required".into(),
            )),
        }
    }
}

/// Response from `/status` once the run completed.
#[derive(Debug, Serialize)]
struct StatusResponse {
    status: RunStatus,
    answer: String,
}

/// Query of `/messages`.
#[derive(Debug, Deserialize)]
struct MessagesQuery {
    thread_id: Option<String>,
}

/// Message DTO for API responses.
#[derive(Debug, Serialize)]
struct MessageDto {
    role: String,
    content: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET / - Health check.
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Welcome to the assistant gateway",
    }))
}

/// POST /ask - Submit a question and wait for the reply.
async fn ask(
    State(state): State<AppState>,
    body: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, HandlerError> {
    let (question, thread) = QuestionRequest::from_body(body)?;
    info!(name: "http.ask", thread_id = ?thread, "Received ask request");

    let cancel = state.shutdown.child_token();
    let answer = state.runs.ask(thread, &question, &cancel).await?;

    Ok(Json(AskResponse {
        question,
        answer: answer.text,
        thread_id: answer.handle.thread_id.to_string(),
        run_id: answer.handle.run_id,
    }))
}

/// POST /start - Submit a question and return the run handle immediately.
async fn start(
    State(state): State<AppState>,
    body: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<StartResponse>, HandlerError> {
    let (question, thread) = QuestionRequest::from_body(body)?;
    info!(name: "http.start", thread_id = ?thread, "Received start request");

    let submission = state.runs.submit(thread, &question).await?;

    Ok(Json(StartResponse {
        thread_id: submission.handle.thread_id.to_string(),
        run_id: submission.handle.run_id,
        status: submission.status,
    }))
}

/// GET /status - One bounded wait on a started run.
async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, RunError> {
    let handle = query.into_handle()?;
    info!(name: "http.status", run = %handle, "Received status request");

    let cancel = state.shutdown.child_token();
    let answer = state.runs.probe(&handle, &cancel).await?;

    Ok(Json(StatusResponse {
        status: RunStatus::Completed,
        answer,
    }))
}

/// GET /messages - Transcript of a thread.
async fn messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<MessageDto>>, RunError> {
    let thread = non_empty(query.thread_id)
        .map(ConversationHandle::new)
        .ok_or_else(|| RunError::InvalidInput("'thread_id' is required".into()))?;

    let transcript = state.runs.transcript(&thread).await?;
    Ok(Json(
        transcript
            .into_iter()
            .map(|entry| MessageDto {
                role: entry.role,
                content: entry.content,
            })
            .collect(),
    ))
}
