//! Persisted offline action log.
//!
//! Mutating calls that fail for connectivity reasons are recorded as
//! [`PendingAction`]s in the client store and replayed by [`OfflineLog::sync`]
//! strictly oldest first. An entry leaves the log only after its replay
//! succeeded; the first failure stops the replay and leaves it and every
//! later entry in place.

use std::sync::Arc;

use parley_core::{ParleyError, PendingAction, Result, SyncError};
use parley_store::ClientStore;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::ChatApi;

/// Outcome of one [`OfflineLog::sync`].
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Actions replayed and removed.
    pub replayed: usize,
    /// Actions still persisted.
    pub remaining: usize,
    /// The failure that stopped the replay.
    pub error: Option<SyncError>,
}

impl SyncReport {
    /// Whether the log was fully drained.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.remaining == 0
    }
}

/// Result of [`OfflineLog::call_or_defer`].
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The call went through.
    Completed(Value),
    /// The backend was unreachable; the action was logged for replay.
    Deferred {
        /// Actions now waiting.
        pending: usize,
    },
}

/// FIFO of deferred actions backed by a [`ClientStore`].
pub struct OfflineLog {
    store: Arc<dyn ClientStore>,
}

impl OfflineLog {
    /// Log persisted in `store`.
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    /// Append an action; returns the new log length.
    pub fn record(&self, action: PendingAction) -> Result<usize> {
        let mut actions = self.store.offline_actions();
        actions.push(action);
        self.store.set_offline_actions(&actions)?;
        Ok(actions.len())
    }

    /// Logged actions, oldest first.
    pub fn pending(&self) -> Vec<PendingAction> {
        self.store.offline_actions()
    }

    /// Number of logged actions.
    pub fn len(&self) -> usize {
        self.store.offline_actions().len()
    }

    /// Whether nothing is logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replay logged actions through `api`, oldest first.
    ///
    /// Failures are logged, not returned: the report carries the error and
    /// the entries stay for the next trigger.
    pub async fn sync(&self, api: &dyn ChatApi) -> SyncReport {
        let mut actions = self.store.offline_actions();
        if actions.is_empty() {
            return SyncReport::default();
        }
        info!(pending = actions.len(), "replaying offline actions");

        let mut replayed = 0;
        while let Some(action) = actions.first() {
            if let Err(e) = api.execute(action).await {
                warn!(
                    method = %action.method,
                    endpoint = %action.endpoint,
                    error = %e,
                    remaining = actions.len(),
                    "offline replay stopped"
                );
                let error = SyncError {
                    endpoint: action.endpoint.clone(),
                    method: action.method.to_string(),
                    source: Box::new(e),
                };
                return SyncReport {
                    replayed,
                    remaining: actions.len(),
                    error: Some(error),
                };
            }
            debug!(method = %action.method, endpoint = %action.endpoint, "offline action replayed");
            let _ = actions.remove(0);
            replayed += 1;
            if let Err(e) = self.store.set_offline_actions(&actions) {
                warn!(error = %e, "failed to persist offline log after replay");
                return SyncReport {
                    replayed,
                    remaining: actions.len(),
                    error: Some(SyncError {
                        endpoint: String::new(),
                        method: String::new(),
                        source: Box::new(ParleyError::from(e)),
                    }),
                };
            }
        }
        info!(replayed, "offline log drained");
        SyncReport {
            replayed,
            remaining: 0,
            error: None,
        }
    }

    /// Perform `action` now, deferring it to the log if the backend is
    /// unreachable. Other failures are returned.
    pub async fn call_or_defer(&self, api: &dyn ChatApi, action: PendingAction) -> Result<Outcome> {
        match api.execute(&action).await {
            Ok(body) => Ok(Outcome::Completed(body)),
            Err(e) if e.is_connectivity() => {
                info!(
                    method = %action.method,
                    endpoint = %action.endpoint,
                    error = %e,
                    "backend unreachable; deferring action"
                );
                let pending = self.record(action)?;
                Ok(Outcome::Deferred { pending })
            }
            Err(e) => Err(e),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
