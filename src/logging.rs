// 📜 Logging - tracing subscriber setup
// Logs go to stderr; stdout is reserved for the proof JSON.

use crate::config::LoggingConfig;
use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber. RUST_LOG wins over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(&config.level)))?;

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.format.as_str() {
        "json" => {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_line_number(true)
                .with_file(true)
                .with_writer(std::io::stderr);

            subscriber.with(json_layer).try_init()?;
        }
        "compact" => {
            let compact_layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);

            subscriber.with(compact_layer).try_init()?;
        }
        _ => {
            let show_location = matches!(config.level.as_str(), "debug" | "trace");

            let pretty_layer = fmt::layer()
                .with_target(show_location)
                .with_line_number(show_location)
                .with_file(show_location)
                .with_writer(std::io::stderr);

            subscriber.with(pretty_layer).try_init()?;
        }
    }

    Ok(())
}

/// Scope the level to this crate so dependency chatter stays quiet
fn filter_directive(level: &str) -> String {
    format!("warn,netflix_proof={}", level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_parses() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let directive = filter_directive(level);
            assert!(EnvFilter::try_new(&directive).is_ok(), "{}", directive);
        }
    }
}
