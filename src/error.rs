//! Error types for Mortgage Assist.

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Responder error: {0}")]
    Llm(#[from] LlmError),

    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),
}

/// External responder (LLM) errors.
///
/// None of these are surfaced to the user: the engine treats any responder
/// failure as "unavailable" and falls back to the static step text.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snapshot persistence errors. Logged and swallowed — the conversation
/// continues even if the snapshot write fails.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the assistant.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_converts_into_top_level() {
        let err: Error = LlmError::Timeout.into();
        assert!(matches!(err, Error::Llm(LlmError::Timeout)));
        assert_eq!(err.to_string(), "Responder error: Request timed out");
    }

    #[test]
    fn store_error_converts_into_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = StoreError::from(io).into();
        assert!(err.to_string().starts_with("Snapshot store error:"));
    }
}
