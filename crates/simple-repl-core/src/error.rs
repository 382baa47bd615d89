//! Error types for simple-repl.

use thiserror::Error;

/// Main error type for simple-repl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No live session registered under the name
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// PTY-related errors (spawn, write, kill)
    #[error("PTY error: {0}")]
    PtyError(String),

    /// The surface host refused an operation
    #[error("Surface error: {0}")]
    Surface(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input or parameters (generic)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
