//! Logging system setup and configuration.
//!
//! Installs a tracing-subscriber registry with either human-readable or
//! JSON output. Embedding hosts that already own a subscriber simply skip
//! this and the crate's `tracing` events flow into theirs.

use crate::config::LoggingSettings;
use crate::error::{PluginHostError, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber from the logging settings.
///
/// Exactly one of the two output layers is active; the other is `None`, which
/// a registry treats as an absent layer.
///
/// # Arguments
///
/// * `config` - Logging section of the host configuration
///
/// # Returns
///
/// `Ok(())` once the subscriber is installed, or
/// [`PluginHostError::Logging`] if a global subscriber already exists.
///
/// # Features
///
/// * **Environment variable support** - `RUST_LOG` takes precedence over the
///   configured level when set
/// * **Structured output** - JSON lines when `json_format` is on, ANSI text
///   otherwise
/// * **Thread information** - thread ids and names on every line, since
///   handlers run on whichever thread sent the event
pub fn setup_logging(config: &LoggingSettings) -> Result<()> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let json_layer = config.json_format.then(|| {
        fmt::layer()
            .json()
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(true)
            .with_thread_names(true)
    });
    let text_layer = (!config.json_format).then(|| {
        fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .with_thread_ids(true)
            .with_thread_names(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| PluginHostError::Logging(e.to_string()))?;

    info!(
        "🔧 Logging initialized with level: {} ({})",
        log_level,
        if config.json_format { "json" } else { "text" }
    );
    Ok(())
}
