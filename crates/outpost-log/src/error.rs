//! Error types for the log sinks.

/// Errors that can occur while writing or installing the log sinks.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Creating the log directory or writing a log file failed.
    #[error("log file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// A global subscriber was already installed.
    #[error("failed to install log subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}
