//! Duplex wire protocol.
//!
//! Every WebSocket text frame is a JSON object tagged by `type`.
//!
//! Client → server:
//! - `user_message` `{message, session_id?}`
//! - `create_session`
//!
//! Server → client:
//! - `session_created` `{session}`
//! - `bot_typing`
//! - `bot_response` `{message}`
//! - `error` `{message}`
//!
//! Unrecognized server frame types decode to [`ServerFrame::Unknown`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, SessionId};
use crate::model::{Message, Sender, Session};
use crate::time::deserialize_lenient;

/// Frame sent from the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// A chat message typed by the user.
    UserMessage {
        /// Message body.
        message: String,
        /// Target session; the server falls back to the connection's
        /// current session when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
    /// Ask the server to open a fresh session.
    CreateSession,
}

impl ClientFrame {
    /// Build a `user_message` frame.
    #[must_use]
    pub fn user_message(message: impl Into<String>, session_id: Option<SessionId>) -> Self {
        Self::UserMessage {
            message: message.into(),
            session_id,
        }
    }

    /// Serialize to the JSON text sent over the socket.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Frame received from the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// The server bound this connection to a session.
    SessionCreated {
        /// The session.
        session: WireSession,
    },
    /// The bot is composing a reply.
    BotTyping,
    /// A bot reply.
    BotResponse {
        /// The reply.
        message: WireMessage,
    },
    /// A non-fatal server-side error; the connection stays open.
    Error {
        /// Human-readable description.
        message: String,
    },
    /// Any frame type this client does not understand.
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    /// Decode a text frame.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Session as serialized by the backend.
///
/// The duplex server sends `{id, created_at}` with an integer id; the
/// request/response server additionally sends a string `session_id`, which
/// is the id the rest of its API expects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSession {
    /// Primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SessionId>,
    /// Public session id (request/response backends).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Creation time.
    #[serde(
        default,
        deserialize_with = "deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl WireSession {
    /// Convert to a [`Session`], preferring the public `session_id`.
    ///
    /// Returns `None` when the backend sent neither id.
    pub fn into_session(self) -> Option<Session> {
        let id = self.session_id.or(self.id)?;
        Some(Session {
            id,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Message as serialized by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Message body.
    #[serde(alias = "text")]
    pub content: String,
    /// Author; replies without one are bot messages.
    #[serde(default = "default_sender")]
    pub sender: Sender,
    /// Creation time.
    #[serde(
        default,
        alias = "timestamp",
        deserialize_with = "deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_sender() -> Sender {
    Sender::Bot
}

impl WireMessage {
    /// Convert to a [`Message`], stamping now when the backend sent no time.
    pub fn into_message(self) -> Message {
        Message {
            id: self.id,
            sender: self.sender,
            text: self.content,
            timestamp: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
