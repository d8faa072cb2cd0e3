//! Store error types.

use parley_core::ParleyError;

/// Errors that can occur while persisting the client document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for ParleyError {
    fn from(err: StoreError) -> Self {
        ParleyError::storage(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::ErrorCategory;

    #[test]
    fn converts_to_storage_error() {
        let err = StoreError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = ParleyError::from(err);
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert!(err.to_string().contains("denied"));
    }
}
