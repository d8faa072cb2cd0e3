//! Reconnect delay calculation.
//!
//! Pure math only; the async reconnect loop lives in `parley-client`.
//!
//! The default policy waits a fixed 3000 ms before every attempt and never
//! gives up. An exponential strategy with a cap, jitter and an attempt limit
//! can be opted into through settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay before a reconnect attempt in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;
/// Default cap for the exponential strategy in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 60_000;

/// How the delay evolves across consecutive failed attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectStrategy {
    /// Same delay every time.
    #[default]
    Fixed,
    /// `delay * 2^attempt`, capped at `max_delay_ms`.
    Exponential,
}

/// Reconnect parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectPolicy {
    /// Base delay in ms (default: 3000).
    pub delay_ms: u64,
    /// Delay strategy (default: fixed).
    pub strategy: ReconnectStrategy,
    /// Cap for the exponential strategy in ms (default: 60000).
    pub max_delay_ms: u64,
    /// Give up after this many consecutive failed attempts (default: never).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Jitter factor 0.0–1.0 applied to exponential delays (default: 0).
    pub jitter_factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            strategy: ReconnectStrategy::Fixed,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_attempts: None,
            jitter_factor: 0.0,
        }
    }
}

impl ReconnectPolicy {
    /// Fixed-delay policy with the given delay.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    /// Delay before reconnect attempt `attempt` (zero-based count of
    /// consecutive failures so far), or `None` once attempts are exhausted.
    ///
    /// Jitter is taken at its midpoint; use [`Self::delay_with_random`] for
    /// randomized delays.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        self.delay_with_random(attempt, 0.5)
    }

    /// Like [`Self::delay_for`] with an explicit random value in `[0.0, 1.0)`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn delay_with_random(&self, attempt: u32, random: f64) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| attempt >= max) {
            return None;
        }
        let ms = match self.strategy {
            ReconnectStrategy::Fixed => self.delay_ms,
            ReconnectStrategy::Exponential => {
                let exponential = self.delay_ms.saturating_mul(1u64 << attempt.min(31));
                let capped = exponential.min(self.max_delay_ms);
                // Maps random [0,1) to [-jitter, +jitter]
                let jitter = 1.0 + (random * 2.0 - 1.0) * self.jitter_factor;
                ((capped as f64) * jitter).round().max(0.0) as u64
            }
        };
        Some(Duration::from_millis(ms))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fixed_three_seconds_forever() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(0), Some(Duration::from_millis(3000)));
        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(3000)));
        assert_eq!(policy.delay_for(10_000), Some(Duration::from_millis(3000)));
    }

    #[test]
    fn fixed_ignores_jitter() {
        let policy = ReconnectPolicy {
            jitter_factor: 0.5,
            ..ReconnectPolicy::default()
        };
        assert_eq!(
            policy.delay_with_random(3, 0.0),
            Some(Duration::from_millis(3000))
        );
    }

    #[test]
    fn exponential_growth_and_cap() {
        let policy = ReconnectPolicy {
            delay_ms: 1000,
            strategy: ReconnectStrategy::Exponential,
            max_delay_ms: 5000,
            ..ReconnectPolicy::default()
        };
        let ms = |a| policy.delay_for(a).unwrap().as_millis();
        assert_eq!(ms(0), 1000);
        assert_eq!(ms(1), 2000);
        assert_eq!(ms(2), 4000);
        assert_eq!(ms(3), 5000);
        assert_eq!(ms(100), 5000);
    }

    #[test]
    fn exponential_jitter_bounds() {
        let policy = ReconnectPolicy {
            delay_ms: 1000,
            strategy: ReconnectStrategy::Exponential,
            jitter_factor: 0.2,
            ..ReconnectPolicy::default()
        };
        assert_eq!(policy.delay_with_random(0, 0.0).unwrap().as_millis(), 800);
        assert_eq!(policy.delay_with_random(0, 0.5).unwrap().as_millis(), 1000);
        assert_eq!(policy.delay_with_random(0, 1.0).unwrap().as_millis(), 1200);
    }

    #[test]
    fn max_attempts_exhausts() {
        let policy = ReconnectPolicy {
            max_attempts: Some(2),
            ..ReconnectPolicy::default()
        };
        assert!(policy.delay_for(0).is_some());
        assert!(policy.delay_for(1).is_some());
        assert!(policy.delay_for(2).is_none());
    }

    #[test]
    fn serde_defaults_and_names() {
        let policy: ReconnectPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, ReconnectPolicy::default());
        let policy: ReconnectPolicy =
            serde_json::from_str(r#"{"delayMs": 500, "strategy": "exponential", "maxAttempts": 4}"#)
                .unwrap();
        assert_eq!(policy.delay_ms, 500);
        assert_eq!(policy.strategy, ReconnectStrategy::Exponential);
        assert_eq!(policy.max_attempts, Some(4));
    }

    #[test]
    fn fixed_constructor() {
        let policy = ReconnectPolicy::fixed(Duration::from_millis(250));
        assert_eq!(policy.delay_for(7), Some(Duration::from_millis(250)));
    }
}
