//! Assistant Gateway
//!
//! Entry point: serves the HTTP API by default, or asks a single question
//! from the command line with `assistant-gateway ask "<question>"`.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use assistant_gateway::config::{AppConfig, Cli, Command};
use assistant_gateway::runs::{ConversationHandle, RunService};
use assistant_gateway::{server, telemetry};
use clap::Parser;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();

    // Missing credentials or assistant id stop the process before anything binds.
    let config = match AppConfig::load_from_cli(&cli) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init(config.telemetry.format);

    if let Err(e) = run(cli.command.unwrap_or(Command::Serve), config).await {
        tracing::error!(name: "app.failed", error = ?e, "Fatal error");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Command, config: Arc<AppConfig>) -> anyhow::Result<()> {
    let runs = Arc::new(
        RunService::from_config(&config).context("Failed to build assistant client")?,
    );

    match command {
        Command::Serve => server::start_server(config, runs).await,
        Command::Ask {
            question,
            thread_id,
            transcript,
        } => {
            let cancel = CancellationToken::new();
            let ctrl_c_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c_cancel.cancel();
                }
            });

            let thread = thread_id.map(ConversationHandle::new);
            let answer = runs.ask(thread, &question, &cancel).await?;
            info!(
                name: "cli.answered",
                run = %answer.handle,
                "Answer received"
            );

            println!("{}", answer.text);

            if transcript {
                println!();
                for entry in runs.transcript(answer.handle.thread()).await? {
                    println!("[{}] {}", entry.role, entry.content);
                }
            }
            println!();
            println!("thread_id: {}", answer.handle.thread());
            Ok(())
        }
    }
}
