use tracing_subscriber::{
    EnvFilter,
    fmt::format::FmtSpan,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LoggingFormat, TelemetryConfig};

// Initialize tracing-subscriber. Logs go to stderr; stdout carries the
// generated artifacts.
pub fn init(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},jwks_forge={}",
            tracing::Level::WARN,
            tracing::Level::from(config.level),
        ))
    });

    let fmt_layer = match config.format {
        LoggingFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LoggingFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    if let Err(err) = registry.try_init() {
        eprintln!("{err:?}");
    }
}
