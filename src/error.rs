//! Error types for echoscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchoscribeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Recognition errors
    #[error("Recognition model not found at {path}")]
    RecognitionModelNotFound { path: String },

    #[error("Recognition failed: {message}")]
    Recognition { message: String },

    // Scratch resource errors (temp WAV files backing recognition calls)
    #[error("Resource error: {message}")]
    Resource { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, EchoscribeError>;
