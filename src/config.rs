use std::env;
use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Environment variable holding the remote API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable naming the preconfigured assistant.
pub const ASSISTANT_ID_ENV: &str = "EXISTING_ASSISTANT_ID";
/// Optional override of the remote API root.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Enable rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Ask a single question and print the reply
    Ask {
        /// The question to send to the assistant
        question: String,
        /// Continue an existing thread
        #[arg(long)]
        thread_id: Option<String>,
        /// Print the whole thread after the reply
        #[arg(long)]
        transcript: bool,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub assistant: AssistantConfig,
    pub polling: PollingConfig,
    pub resilience: ResilienceConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct AssistantConfig {
    pub api_key: String,
    pub assistant_id: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Tool types to install on the assistant at startup. Empty leaves it untouched.
    #[serde(default)]
    pub tools: Vec<String>,
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &"<redacted>")
            .field("assistant_id", &self.assistant_id)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub timeout_secs: u64,
    pub interval_ms: u64,
    /// Bounded wait of a `/status` call. Zero means a single probe.
    pub status_wait_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub rate_limit_enabled: bool,
    pub requests_per_second: f32,
    pub burst_size: f32,
    pub timeout_disabled: bool,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
}

impl AssistantConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn status_wait(&self) -> Duration {
        Duration::from_secs(self.status_wait_secs)
    }
}

impl ResilienceConfig {
    /// Request timeout applied by the middleware. Disabled means one year.
    pub fn request_timeout(&self) -> Duration {
        if self.timeout_disabled {
            Duration::from_secs(365 * 24 * 60 * 60)
        } else {
            Duration::from_secs(self.request_timeout_secs)
        }
    }
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::load_from_cli(&cli)
    }

    pub fn load_from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("assistant.api_key", "")?
            .set_default("assistant.assistant_id", "")?
            .set_default("assistant.base_url", "https://api.openai.com/v1")?
            .set_default("assistant.request_timeout_secs", 30)?
            .set_default("polling.timeout_secs", 60)?
            .set_default("polling.interval_ms", 1000)?
            .set_default("polling.status_wait_secs", 10)?
            .set_default("resilience.rate_limit_enabled", true)?
            .set_default("resilience.requests_per_second", 5.0)?
            .set_default("resilience.burst_size", 10.0)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.request_timeout_secs", 120)?
            .set_default("telemetry.format", "compact")?;

        // 2. Config file: --config / CONFIG_FILE, else ./config.yaml when present
        match &cli.config {
            Some(path) => builder = builder.add_source(File::with_name(path)),
            None if Path::new("config.yaml").exists() => {
                builder = builder.add_source(File::with_name("config.yaml"));
            }
            None => {}
        }

        // 3. Prefixed environment, e.g. GATEWAY_POLLING__INTERVAL_MS=500
        builder = builder.add_source(
            Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("assistant.tools")
                .try_parsing(true),
        );

        // 4. Well-known unprefixed variables
        if let Ok(val) = env::var(API_KEY_ENV) {
            builder = builder.set_override("assistant.api_key", val)?;
        }
        if let Ok(val) = env::var(ASSISTANT_ID_ENV) {
            builder = builder.set_override("assistant.assistant_id", val)?;
        }
        if let Ok(val) = env::var(BASE_URL_ENV) {
            builder = builder.set_override("assistant.base_url", val)?;
        }

        // 5. CLI flags (clap also folds in their own env vars)
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("resilience.rate_limit_enabled", rl)?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.assistant.api_key.trim().is_empty() {
            return Err(config::ConfigError::Message(format!(
                "Missing required env var: {API_KEY_ENV}"
            )));
        }
        if self.assistant.assistant_id.trim().is_empty() {
            return Err(config::ConfigError::Message(format!(
                "Missing required env var: {ASSISTANT_ID_ENV}"
            )));
        }
        if self.polling.interval_ms == 0 {
            return Err(config::ConfigError::Message(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        if !self.resilience.timeout_disabled
            && self.resilience.request_timeout_secs <= self.polling.timeout_secs
        {
            return Err(config::ConfigError::Message(format!(
                "resilience.request_timeout_secs ({}) must exceed polling.timeout_secs ({})",
                self.resilience.request_timeout_secs, self.polling.timeout_secs
            )));
        }
        Ok(())
    }
}
