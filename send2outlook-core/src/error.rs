//! Error types for send2outlook-core.

use thiserror::Error;

/// Result type alias using send2outlook-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for send2outlook-core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Path discovery error.
    #[error("path error: {0}")]
    Path(String),

    /// Settings persistence error.
    #[error("settings error: {0}")]
    Settings(String),

    /// Markdown rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// Scripting runner failed to start or exited unsuccessfully.
    #[error("{0}")]
    Dispatch(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
