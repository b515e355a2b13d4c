use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::LogFormat;

/// Initialize structured logging.
///
/// - `EnvFilter` for dynamic log levels (`RUST_LOG`), defaulting to
///   `info,assistant_gateway=debug`.
/// - `compact` human-readable output or one JSON object per line.
pub fn init(format: LogFormat) {
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,assistant_gateway=debug"));
    let registry = tracing_subscriber::registry().with(filter_layer);

    match format {
        LogFormat::Compact => registry.with(compact_layer(std::io::stdout)).init(),
        LogFormat::Json => registry.with(json_layer(std::io::stdout)).init(),
    }
}

fn compact_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact()
}

fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    // `with_current_span` only exists once the formatter is JSON.
    fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .json()
        .with_current_span(true)
}
