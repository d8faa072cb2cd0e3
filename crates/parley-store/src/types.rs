//! The persisted client document.

use std::fmt;
use std::str::FromStr;

use parley_core::PendingAction;
use serde::{Deserialize, Serialize};

/// Color theme preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark theme.
    #[default]
    Dark,
    /// Light theme.
    Light,
}

impl Theme {
    /// The other theme.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dark => f.write_str("dark"),
            Self::Light => f.write_str("light"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Everything the client persists between runs.
///
/// Keys: `token`, `theme`, `notifications`, `offlineActions`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientDocument {
    /// Bearer token from the last successful login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Theme preference.
    pub theme: Theme,
    /// Whether info and success notices are shown.
    pub notifications: bool,
    /// Deferred mutating calls, oldest first.
    pub offline_actions: Vec<PendingAction>,
}

impl Default for ClientDocument {
    fn default() -> Self {
        Self {
            token: None,
            theme: Theme::Dark,
            notifications: true,
            offline_actions: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
