//! Error types for fluentme.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FluentError {
    // Assessment selection
    #[error("Invalid assessment: {reason}")]
    InvalidAssessment { reason: String },

    // Audio capture errors
    #[error("Audio device unavailable: {message}")]
    DeviceUnavailable { message: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Recognition errors
    #[error("Speech recognition unavailable: {message}")]
    RecognitionUnavailable { message: String },

    // Persisted profile errors
    #[error("Stored profile at {path} is corrupt: {message}")]
    CorruptPersistedState { path: String, message: String },

    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FluentError>;

impl FluentError {
    /// True for failures that end a session before or during capture.
    ///
    /// Recognition and persisted-state problems degrade instead.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FluentError::InvalidAssessment { .. } | FluentError::DeviceUnavailable { .. }
        )
    }
}
