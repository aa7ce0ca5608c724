//! Error types for the room settings engine.

/// Top-level error type for room settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The action is not permitted for the current identity and room state.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Identity token retrieval failed or no user is signed in.
    #[error("credential error: {0}")]
    Credential(String),

    /// Remote lookup (room resolver or announcement search) failed.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Outbound channel send error.
    #[error("channel error: {0}")]
    Channel(String),

    /// Local persistent store error.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Malformed value supplied by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Background work was requested outside a tokio runtime.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SettingsError>;
