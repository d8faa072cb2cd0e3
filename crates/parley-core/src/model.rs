//! Client data model.
//!
//! [`Session`] and [`Message`] values are immutable once built: a new session
//! replaces the old one wholesale and messages are only ever appended or
//! bulk-cleared.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, SessionId, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// A server-tracked conversation context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque session id.
    pub id: SessionId,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Build a session with the given id, stamped now.
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────────────────────────

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The local user.
    User,
    /// The assistant.
    #[serde(alias = "assistant")]
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Bot => f.write_str("bot"),
        }
    }
}

/// A chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server id, absent for messages not yet persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Author.
    pub sender: Sender,
    /// Message body.
    pub text: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// A message typed by the local user, stamped now.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: None,
            sender: Sender::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// A bot-authored message, stamped now.
    #[must_use]
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            id: None,
            sender: Sender::Bot,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a server id.
    #[must_use]
    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// The authenticated account as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Login email.
    pub email: String,
    /// Display name, when the backend has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Pending offline actions
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP method of a deferred mutating call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionMethod {
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl ActionMethod {
    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ActionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutating API call deferred while the backend was unreachable.
///
/// Persisted under the `offlineActions` key; the legacy `data` field name is
/// accepted on read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Endpoint path relative to the API base URL.
    pub endpoint: String,
    /// HTTP method.
    pub method: ActionMethod,
    /// JSON request body.
    #[serde(default, alias = "data", skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// When the call was first attempted.
    pub timestamp: DateTime<Utc>,
}

impl PendingAction {
    /// Record a call attempted now.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        method: ActionMethod,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            payload,
            timestamp: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection state
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of the duplex connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// A connection attempt is in flight.
    Connecting,
    /// Frames can be sent immediately.
    Open,
    /// No connection and none scheduled.
    #[default]
    Closed,
    /// Waiting for the next scheduled attempt.
    Reconnecting,
}

impl ConnectionState {
    /// Whether outbound frames can be transmitted right now.
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
            Self::Reconnecting => f.write_str("reconnecting"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
