//! Core error types for Interlude

use thiserror::Error;

/// Result type alias for Interlude operations
pub type InterludeResult<T> = Result<T, InterludeError>;

/// Unified error trait implemented by every Interlude error.
///
/// Gives reporters a stable code to key on, independent of the
/// human-readable message:
/// - error_code(): Unique code for programmatic error identification
/// - message(): Human-readable error message
/// - context(): Optional additional context
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Whether this error is routine noise (stale buttons, replays, junk events)
    /// rather than a fault an operator should look at
    fn is_expected_noise(&self) -> bool {
        false
    }
}

/// Main error type for Interlude
///
/// None of these are fatal to the process: the store, dispatcher, sweeper and
/// persistence paths hand them to an [`crate::reporter::ErrorReporter`] and
/// carry on.
#[derive(Error, Debug, Clone)]
pub enum InterludeError {
    /// Inbound payload could not be decoded into `(token, index)`
    #[error("Malformed event: {message}")]
    MalformedEvent {
        message: String,
        payload: Option<String>,
    },

    /// No session is stored under the token (never issued, swept, or lost on reload)
    #[error("Unknown or expired token: {token}")]
    UnknownToken { token: String },

    /// The session already carries a selection
    #[error("Token {token} already resolved with option {selection}")]
    AlreadyResolved { token: String, selection: usize },

    /// The selected index does not name one of the session's options
    #[error("Option {index} is out of range for token {token} ({available} options)")]
    InvalidSelection {
        token: String,
        index: usize,
        available: usize,
    },

    /// A snapshot could not be written
    #[error("Snapshot write failed: {message}")]
    PersistenceWrite {
        message: String,
        path: Option<String>,
    },

    /// A snapshot could not be read or parsed at startup
    #[error("Snapshot load failed: {message}")]
    PersistenceLoad {
        message: String,
        path: Option<String>,
    },

    /// A resumed continuation returned an error or panicked
    #[error("Continuation '{kind}' failed for token {token}: {message}")]
    Continuation {
        token: String,
        kind: String,
        message: String,
    },

    /// An expiry pass failed
    #[error("Sweep failed: {message}")]
    Sweep { message: String },

    /// Called outside of a tokio runtime
    #[error("Runtime error: {message}")]
    Runtime { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// The token counter is at its ceiling; no further token can be issued
    #[error("Token space exhausted (last issued {last:X})")]
    TokensExhausted { last: u64 },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },
}
