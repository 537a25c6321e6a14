//! Error types for the llmgate domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` wraps them.

use thiserror::Error;

/// The top-level error type for all llmgate operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Knowledge store errors ---
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Inference backend errors ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    #[error("Knowledge entry {0} not found")]
    NotFound(i64),

    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend answered, but not with a success status.
    #[error("Backend returned status {status}: {body}")]
    Unavailable { status: u16, body: String },

    /// Connection refused, timed out, or the response body broke off.
    #[error("Backend connection error: {0}")]
    Connection(String),

    /// The backend accepted the request but reported a failure in its payload.
    #[error("Backend generation failed: {0}")]
    Generation(String),
}
