//! Error types for the docchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for docchat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Document errors ---
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    // --- Completion service errors ---
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("User input is empty")]
    EmptyInput,

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// What went wrong talking to the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Network,
    Authentication,
    RateLimited,
    Rejected,
    MalformedResponse,
    Timeout,
}

/// A failed completion call.
///
/// `Display` renders only the remote detail, since that text ends up
/// verbatim in the transcript.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::RateLimited, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::MalformedResponse, message)
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Document contains no pages")]
    Empty,

    #[error("Failed to extract page {index}: {reason}")]
    Page { index: usize, reason: String },

    #[error("Failed to read {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}
