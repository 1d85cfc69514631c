//! Error types for the plugin host

/// Main error type for the plugin host
///
/// Handler and hook failures never surface here: they are isolated and
/// reported where they happen. What remains are the failures a caller can
/// actually act on.
#[derive(Debug, thiserror::Error)]
pub enum PluginHostError {
    /// An event could not be built from the arguments given to `send_from`
    #[error("Failed to construct event {event}: {reason}")]
    EventConstruction {
        /// Event type that was requested
        event: &'static str,
        /// Why construction failed
        reason: String,
    },

    /// Configuration is structurally valid TOML but semantically wrong
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The tracing subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// A version string did not have the `major.minor.patch` shape
    #[error("Invalid version: {0}")]
    InvalidVersion(String),
}

/// Errors raised by event handlers
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Handler execution failed
    #[error("Handler execution failed: {0}")]
    ExecutionFailed(String),

    /// Handler panicked while running
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// The erased callback was handed an event of another type
    #[error("Event type mismatch: expected {expected}")]
    TypeMismatch {
        /// Event type the handler was registered for
        expected: &'static str,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::ExecutionFailed`]
    pub fn failed(message: impl std::fmt::Display) -> Self {
        HandlerError::ExecutionFailed(message.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::ExecutionFailed(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::ExecutionFailed(message.to_string())
    }
}

/// Errors raised by plugin hooks and plugin factories
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A lifecycle hook reported failure
    #[error("Plugin hook failed: {0}")]
    HookFailed(String),

    /// A lifecycle hook or factory panicked
    #[error("Plugin panicked: {0}")]
    Panicked(String),

    /// A factory could not produce a plugin instance
    #[error("Plugin instantiation failed: {0}")]
    InstantiationFailed(String),
}

impl PluginError {
    /// Shorthand for [`PluginError::HookFailed`]
    pub fn hook(message: impl std::fmt::Display) -> Self {
        PluginError::HookFailed(message.to_string())
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, PluginHostError>;

/// Result returned by every event handler
pub type HandlerResult = std::result::Result<(), HandlerError>;
