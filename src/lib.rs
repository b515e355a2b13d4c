//! Assistant Gateway
//!
//! A small HTTP service in front of a hosted conversational assistant. It
//! posts a question to a thread, starts a run of a preconfigured assistant,
//! waits for the run to finish and returns the reply text.
//!
//! # Architecture
//!
//! - **Server**: Axum router exposing a blocking `/ask` and a split
//!   `/start` + `/status` flow for hosts that cap request duration
//! - **Runs**: submit, poll and extract, behind a cancellable timed wait
//! - **Assistants**: the remote API seam and its `reqwest` implementation
//!
//! # Modules
//!
//! - [`assistants`]: remote API trait, wire types and HTTP client
//! - [`config`]: CLI and layered configuration
//! - [`runs`]: run submission, polling and reply extraction
//! - [`server`]: HTTP routes and middleware
//! - [`telemetry`]: logging setup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod assistants;
pub mod config;
pub mod rate_limit;
pub mod runs;
pub mod server;
pub mod telemetry;

use crate::config::AppConfig;
use crate::rate_limit::SimpleRateLimiter;

use runs::RunService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Run submission and polling.
    pub runs: Arc<RunService>,
    /// Global Rate Limiter
    pub rate_limiter: Arc<SimpleRateLimiter>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
    /// Cancelled when the server shuts down; handlers wait on child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, runs: Arc<RunService>, shutdown: CancellationToken) -> Self {
        let rate_limiter = Arc::new(SimpleRateLimiter::new(
            config.resilience.requests_per_second,
            config.resilience.burst_size,
        ));
        Self {
            runs,
            rate_limiter,
            config,
            shutdown,
        }
    }
}
