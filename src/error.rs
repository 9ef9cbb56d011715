use thiserror::Error;

/// Error raised by a commit or verify attempt against the remote store.
///
/// Every variant belongs to one of two classes (see [`MutationError::class`]):
/// retryable errors are transient and worth reattempting with backoff;
/// rejected errors are terminal and surface to the caller immediately.
#[derive(Error, Debug, Clone)]
pub enum MutationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Attempt timed out after {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited by backend")]
    RateLimited,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Version conflict: expected {expected}, found {actual:?}")]
    VersionConflict { expected: u64, actual: Option<u64> },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Notification channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, MutationError>;

/// Whether an error is worth retrying or must surface immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient availability problem; retry with backoff.
    Retryable,
    /// Terminal: permission, validation, or conflict. Retrying cannot help.
    Rejected,
}

impl From<serde_json::Error> for MutationError {
    fn from(e: serde_json::Error) -> Self {
        MutationError::Json(e.to_string())
    }
}

impl MutationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            MutationError::Network(_)
            | MutationError::Timeout { .. }
            | MutationError::Unavailable(_)
            | MutationError::RateLimited => ErrorClass::Retryable,
            MutationError::PermissionDenied(_)
            | MutationError::Unauthenticated(_)
            | MutationError::Validation(_)
            | MutationError::NotFound(_)
            | MutationError::VersionConflict { .. }
            | MutationError::Json(_)
            | MutationError::ChannelClosed => ErrorClass::Rejected,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}
