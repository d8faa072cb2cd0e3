//! Request/response transport: one HTTP round trip per message.

use std::sync::Arc;
use std::time::Duration;

use parley_core::{Message, Result, SessionId, TransportError};
use tracing::{debug, warn};

use crate::api::ChatApi;

/// Sends each message as `POST /chat/message` and waits for the reply.
#[derive(Clone)]
pub struct RequestTransport {
    api: Arc<dyn ChatApi>,
    timeout: Duration,
}

impl RequestTransport {
    /// Transport over `api`, abandoning replies slower than `timeout`.
    pub fn new(api: Arc<dyn ChatApi>, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    /// Send `text` on `session_id` and return the bot reply.
    pub async fn send(&self, session_id: &SessionId, text: &str) -> Result<Message> {
        debug!(session = %session_id, len = text.len(), "sending chat request");
        match tokio::time::timeout(self.timeout, self.api.send_message(session_id, text)).await {
            Ok(reply) => reply,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms, "chat request timed out");
                Err(TransportError::Timeout { timeout_ms }.into())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
