//! Error types and reporting for the acquisition thread.
//!
//! Errors raised inside the acquisition thread never cross into the caller's
//! thread; they are handed to an [`ErrorReporter`] instead.

use std::fmt;

/// Errors that can occur while a session is running.
#[derive(Debug, Clone, PartialEq)]
pub enum StationError {
    /// Recoverable error that allows the loop to continue.
    Recoverable(String),
    /// Fatal error that ends the session.
    Fatal(String),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            StationError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for StationError {}

/// Trait for reporting errors from the acquisition thread.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from the named station.
    fn report(&self, station: &str, error: &StationError);
}

/// Reporter that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, station: &str, error: &StationError) {
        tracing::warn!("[{station}] {error}");
    }
}
