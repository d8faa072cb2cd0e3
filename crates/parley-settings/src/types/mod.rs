//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`,
//! so a partial JSON file only needs the keys it changes.

mod api;
mod client;

pub use api::*;
pub use client::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings type for the Parley client.
///
/// ```json
/// {
///   "api": { "baseUrl": "https://chat.example.com/api" },
///   "transport": { "mode": "duplex", "reconnect": { "delayMs": 3000 } }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParleySettings {
    /// Backend endpoints.
    pub api: ApiSettings,
    /// Transport selection and reconnect policy.
    pub transport: TransportSettings,
    /// Request cache.
    pub cache: CacheSettings,
    /// Chat input limits.
    pub chat: ChatSettings,
    /// Logging.
    pub logging: LoggingSettings,
    /// Directory for the client store; defaults to `~/.parley`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl ParleySettings {
    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(crate::loader::parley_home)
    }

    /// Path of the persisted client store.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join("client.json")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        let s: ParleySettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, ParleySettings::default());
    }

    #[test]
    fn explicit_data_dir() {
        let s = ParleySettings {
            data_dir: Some(PathBuf::from("/var/lib/parley")),
            ..ParleySettings::default()
        };
        assert_eq!(s.store_path(), PathBuf::from("/var/lib/parley/client.json"));
    }

    #[test]
    fn data_dir_omitted_when_unset() {
        let v = serde_json::to_value(ParleySettings::default()).unwrap();
        assert!(v.get("dataDir").is_none());
        assert_eq!(v["cache"]["ttlMs"], 300_000);
    }
}
