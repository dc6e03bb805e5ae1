//! Diagnostic logging setup.
//!
//! Structured `tracing` output goes to stderr so it never mixes with the
//! menus on stdout. This is separate from the export activity log kept by
//! the engine.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for the logging system.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogConfig {
    /// Enable verbose logging (sets default level to DEBUG)
    pub verbose: bool,
}

/// Initialize the tracing subscriber.
///
/// The level can be overridden at runtime via the `RUST_LOG` environment variable.
pub fn init(config: LogConfig) {
    let default_level = if config.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.verbose)
                .with_file(false)
                .with_line_number(false),
        )
        .init();
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("engine={level},termuxport={level}")
}
