//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ParleySettings::default()`]
//! 2. If `~/.parley/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `PARLEY_*` environment variable overrides (highest priority)
//! 4. Validate URLs
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{LogLevel, ParleySettings, TransportMode};

/// Resolve the Parley home directory (`~/.parley`).
pub fn parley_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".parley")
}

/// Resolve the path to the settings file (`~/.parley/settings.json`).
pub fn settings_path() -> PathBuf {
    parley_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ParleySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or an invalid URL, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ParleySettings> {
    load_settings_with_env(path, |name| std::env::var(name).ok())
}

/// Load settings from `path`, reading overrides through `env`.
pub fn load_settings_with_env(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ParleySettings> {
    let defaults = serde_json::to_value(ParleySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ParleySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `PARLEY_*` overrides looked up through `env`.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut ParleySettings, env: impl Fn(&str) -> Option<String>) {
    let env = EnvReader(env);

    if let Some(v) = env.string("PARLEY_API_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = env.string("PARLEY_WS_URL") {
        settings.api.ws_url = v;
    }
    if let Some(v) = env.parsed::<TransportMode>("PARLEY_TRANSPORT") {
        settings.transport.mode = v;
    }
    if let Some(v) = env.u64_range("PARLEY_RECONNECT_DELAY_MS", 100, 600_000) {
        settings.transport.reconnect.delay_ms = v;
    }
    if let Some(v) = env.u64_range("PARLEY_REQUEST_TIMEOUT_MS", 1000, 600_000) {
        settings.api.request_timeout_ms = v;
    }
    if let Some(v) = env.u64_range("PARLEY_CACHE_TTL_MS", 0, 86_400_000) {
        settings.cache.ttl_ms = v;
    }
    if let Some(v) = env.string("PARLEY_LOG_LEVEL") {
        match parse_log_level(&v) {
            Some(level) => settings.logging.level = level,
            None => tracing::warn!(
                key = "PARLEY_LOG_LEVEL",
                value = %v,
                "invalid log level env var, ignoring"
            ),
        }
    }
    if let Some(v) = env.string("PARLEY_DATA_DIR") {
        settings.data_dir = Some(PathBuf::from(v));
    }
}

/// Reject settings no transport could use.
pub fn validate(settings: &ParleySettings) -> Result<()> {
    let base = &settings.api.base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(invalid("api.baseUrl", format!("expected an http(s) URL, got {base:?}")));
    }
    let ws = &settings.api.ws_url;
    if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
        return Err(invalid("api.wsUrl", format!("expected a ws(s) URL, got {ws:?}")));
    }
    if settings.api.request_timeout_ms == 0 {
        return Err(invalid("api.requestTimeoutMs", "must be positive".into()));
    }
    Ok(())
}

fn invalid(key: &'static str, reason: String) -> SettingsError {
    SettingsError::Invalid { key, reason }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a log level name (case-insensitive).
pub fn parse_log_level(val: &str) -> Option<LogLevel> {
    match val.to_lowercase().as_str() {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" | "warning" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F>(F);

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.is_empty())
    }

    fn u64_range(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }

    fn parsed<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        let val = self.string(name)?;
        let result = val.parse().ok();
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
