//! Session lifecycle: create, load, clear.
//!
//! A message can only be sent while a session is bound. Creation failures
//! leave the manager without a session; nothing retries automatically.

use std::sync::Arc;

use parley_core::{Message, Result, Session, SessionError, SessionId};
use tracing::{info, warn};

use crate::api::ChatApi;

/// Tracks the session the chat is bound to.
pub struct SessionManager {
    api: Arc<dyn ChatApi>,
    current: Option<Session>,
}

impl SessionManager {
    /// Manager with no bound session.
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api, current: None }
    }

    /// Ask the backend for a fresh session and bind it.
    ///
    /// On failure the previous session is dropped and the error returned.
    pub async fn create_session(&mut self) -> Result<&Session> {
        self.current = None;
        match self.api.create_session().await {
            Ok(session) => {
                info!(session = %session.id, "session created");
                Ok(&*self.current.insert(session))
            }
            Err(e) => {
                warn!(error = %e, "session creation failed");
                Err(e)
            }
        }
    }

    /// Bind the backend's current session, if it has one.
    pub async fn load_session(&mut self) -> Result<Option<&Session>> {
        match self.api.current_session().await? {
            Some(session) => {
                info!(session = %session.id, "session loaded");
                Ok(Some(&*self.current.insert(session)))
            }
            None => {
                info!("no current session on the backend");
                Ok(None)
            }
        }
    }

    /// Messages of the bound session.
    pub async fn history(&self) -> Result<Vec<Message>> {
        let id = self.require()?;
        self.api.history(id).await
    }

    /// Bind a session announced by the backend.
    pub fn bind(&mut self, session: Session) {
        info!(session = %session.id, "session bound");
        self.current = Some(session);
    }

    /// Forget the bound session. Returns it if there was one.
    pub fn clear_session(&mut self) -> Option<Session> {
        self.current.take()
    }

    /// The bound session.
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Id of the bound session, or [`SessionError::NoActiveSession`].
    pub fn require(&self) -> std::result::Result<&SessionId, SessionError> {
        self.current
            .as_ref()
            .map(|s| &s.id)
            .ok_or(SessionError::NoActiveSession)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
