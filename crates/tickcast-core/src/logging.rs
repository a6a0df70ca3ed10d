//! Logging initialization using the `tracing` ecosystem.
//!
//! Provides console output (colored, human-readable), optional file output
//! with daily rotation via `tracing-appender`, and level configuration via
//! the `RUST_LOG` env var or an explicit parameter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Call once at program start. `log_level` is the default level when
/// `RUST_LOG` is not set; `log_dir`, when present, enables a daily-rotating
/// file sink prefixed with `module_name`.
pub fn init_logging(log_level: &str, log_dir: Option<&str>, module_name: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    let file_layer = log_dir.map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, module_name);
        fmt::layer().with_writer(appender).with_ansi(false).with_target(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}
