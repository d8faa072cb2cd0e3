//! Backend endpoint settings.

use serde::{Deserialize, Serialize};

/// Backend location and HTTP behaviour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL every endpoint path is joined onto.
    pub base_url: String,
    /// WebSocket URL for the duplex transport.
    pub ws_url: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Endpoint paths.
    pub endpoints: EndpointSettings,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            ws_url: "ws://localhost:8000/ws".to_string(),
            request_timeout_ms: 30_000,
            endpoints: EndpointSettings::default(),
        }
    }
}

/// Endpoint paths relative to [`ApiSettings::base_url`].
///
/// `{id}`, `{list}` and `{book}` are substituted at call time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointSettings {
    /// `POST` credentials, returns a token.
    pub login: String,
    /// `POST` a new account.
    pub register: String,
    /// `GET` the authenticated user.
    pub me: String,
    /// `POST` to open a fresh session.
    pub new_session: String,
    /// `GET` the caller's current session.
    pub current_session: String,
    /// `GET` a session's message history.
    pub session_messages: String,
    /// `POST` a chat message and receive the reply.
    pub chat_message: String,
    /// `GET` the reading lists.
    pub lists: String,
    /// `POST` a book onto a list.
    pub list_add: String,
    /// `DELETE` a book from a list.
    pub list_remove: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            me: "/auth/me".to_string(),
            new_session: "/sessions/new".to_string(),
            current_session: "/sessions/current".to_string(),
            session_messages: "/sessions/{id}/messages".to_string(),
            chat_message: "/chat/message".to_string(),
            lists: "/user/lists".to_string(),
            list_add: "/user/lists/{list}".to_string(),
            list_remove: "/user/lists/{list}/{book}".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
