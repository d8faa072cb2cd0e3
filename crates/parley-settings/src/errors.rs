//! Settings errors.

use thiserror::Error;

/// Why settings could not be loaded.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON, or does not fit the schema.
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
    /// A key holds a value no transport can use.
    #[error("{key}: {reason}")]
    Invalid {
        /// Dotted camelCase path of the offending key, e.g. `api.wsUrl`.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_names_the_key() {
        let err = SettingsError::Invalid {
            key: "api.wsUrl",
            reason: "expected a ws:// or wss:// URL".into(),
        };
        assert_eq!(err.to_string(), "api.wsUrl: expected a ws:// or wss:// URL");
    }

    #[test]
    fn malformed_json_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SettingsError = json_err.into();
        assert!(err.to_string().starts_with("malformed settings"));
    }
}
