//! Error types for pcgscope.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PcgError {
    // Decoding errors
    #[error("Unsupported audio format: {message}")]
    UnsupportedFormat { message: String },

    #[error("Truncated input: expected {expected_bytes} bytes, got {actual_bytes}")]
    TruncatedInput {
        expected_bytes: usize,
        actual_bytes: usize,
    },

    // Capture errors
    #[error("Audio device unavailable: {device} ({message})")]
    DeviceUnavailable { device: String, message: String },

    #[error("No capture device selected")]
    NoDeviceSelected,

    #[error("A capture session is already recording")]
    AlreadyRecording,

    #[error("Audio device read failed: {message}")]
    DeviceRead { message: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // File errors
    #[error("WAV error: {message}")]
    Wav { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PcgError>;

impl PcgError {
    /// Shorthand for [`PcgError::UnsupportedFormat`].
    pub fn unsupported(message: impl Into<String>) -> Self {
        PcgError::UnsupportedFormat {
            message: message.into(),
        }
    }
}
