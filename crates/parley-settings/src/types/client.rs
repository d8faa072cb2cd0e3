//! Transport, cache, chat and logging settings.

use std::fmt;
use std::str::FromStr;

use parley_core::ReconnectPolicy;
use serde::{Deserialize, Serialize};

/// Which transport carries chat messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// One long-lived WebSocket with automatic reconnect.
    #[default]
    Duplex,
    /// One HTTP call per message.
    Request,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplex => f.write_str("duplex"),
            Self::Request => f.write_str("request"),
        }
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "duplex" | "websocket" | "ws" => Ok(Self::Duplex),
            "request" | "http" => Ok(Self::Request),
            other => Err(format!("unknown transport mode: {other}")),
        }
    }
}

/// Transport selection and reconnect behaviour.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportSettings {
    /// Transport mode.
    pub mode: TransportMode,
    /// Duplex reconnect policy.
    pub reconnect: ReconnectPolicy,
}

/// Request cache settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Entry lifetime in milliseconds.
    pub ttl_ms: u64,
    /// Entry count above which the oldest entries are evicted.
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            max_entries: 100,
        }
    }
}

/// Chat input limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// Longest accepted message, in characters.
    pub max_message_chars: usize,
    /// Shortest accepted password at registration.
    pub min_password_chars: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_message_chars: 1000,
            min_password_chars: 6,
        }
    }
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level (most verbose).
    Trace,
    /// Debug-level.
    Debug,
    /// Info-level.
    Info,
    /// Warning-level (default; keeps the terminal quiet).
    #[default]
    Warn,
    /// Error-level.
    Error,
}

impl LogLevel {
    /// Convert to a tracing filter string.
    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log line format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level; `RUST_LOG` takes precedence.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_mode_from_str() {
        assert_eq!("duplex".parse::<TransportMode>(), Ok(TransportMode::Duplex));
        assert_eq!("WS".parse::<TransportMode>(), Ok(TransportMode::Duplex));
        assert_eq!("http".parse::<TransportMode>(), Ok(TransportMode::Request));
        assert!("carrier-pigeon".parse::<TransportMode>().is_err());
    }

    #[test]
    fn transport_reconnect_defaults() {
        let t: TransportSettings = serde_json::from_str(r#"{"mode": "request"}"#).unwrap();
        assert_eq!(t.mode, TransportMode::Request);
        assert_eq!(t.reconnect.delay_ms, 3000);
    }

    #[test]
    fn cache_defaults_five_minutes() {
        assert_eq!(CacheSettings::default().ttl_ms, 5 * 60 * 1000);
    }

    #[test]
    fn log_level_filter_str() {
        assert_eq!(LogLevel::Debug.as_filter_str(), "debug");
        assert_eq!(LogLevel::default().as_filter_str(), "warn");
    }

    #[test]
    fn log_format_serde() {
        let l: LoggingSettings = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(l.format, LogFormat::Json);
        assert_eq!(l.level, LogLevel::Warn);
    }
}
