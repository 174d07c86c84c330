use std::sync::Arc;

use cairn::tools::DiagnosticsSink;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::diagnostics_layer::DiagnosticsLayer;

/// Install the global subscriber: a filtered fmt layer on stderr plus the
/// diagnostics layer, which sees every ERROR event regardless of the filter.
pub fn init_logging(config: &LoggingConfig, diagnostics: Arc<dyn DiagnosticsSink>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(DiagnosticsLayer::new(diagnostics).with_filter(LevelFilter::ERROR));

    match config.format.as_str() {
        "json" => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_filter(env_filter),
                )
                .init();
        }
        _ => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_filter(env_filter),
                )
                .init();
        }
    }
}
