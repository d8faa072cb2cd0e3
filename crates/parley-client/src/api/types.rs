//! Request and response bodies.
//!
//! Response types are lenient: the backends in this family disagree on key
//! names and envelope shapes, so every known variant is accepted.

use parley_core::{Message, User, WireMessage, WireSession};
use serde::{Deserialize, Serialize};

/// `POST /auth/login` body.
#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    /// Account email.
    pub email: &'a str,
    /// Account password.
    pub password: &'a str,
}

/// `POST /auth/login` response.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    #[serde(alias = "token")]
    pub access_token: String,
    /// The authenticated user, when the backend includes it.
    #[serde(default)]
    pub user: Option<User>,
}

/// `POST /auth/register` body.
#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest<'a> {
    /// Account email.
    pub email: &'a str,
    /// Account password.
    pub password: &'a str,
    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
}

/// `POST /chat/message` body.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// Target session.
    pub session_id: &'a parley_core::SessionId,
    /// Message body.
    pub text: &'a str,
}

/// `POST /chat/message` response.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ChatReply {
    /// `{reply: "..."}`
    Reply {
        /// Reply text.
        reply: String,
    },
    /// `{message: {content, ...}}`
    Message {
        /// Reply message.
        message: WireMessage,
    },
}

impl ChatReply {
    /// Convert to a bot [`Message`].
    pub fn into_message(self) -> Message {
        match self {
            Self::Reply { reply } => Message::bot(reply),
            Self::Message { message } => message.into_message(),
        }
    }
}

/// Session endpoints answer either with the session itself or wrapped.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum SessionEnvelope {
    /// `{session: {...}}`
    Wrapped {
        /// The session.
        session: WireSession,
    },
    /// `{id, created_at}` / `{session_id, ...}`
    Bare(WireSession),
}

impl SessionEnvelope {
    /// The wire session inside.
    pub fn into_inner(self) -> WireSession {
        match self {
            Self::Wrapped { session } | Self::Bare(session) => session,
        }
    }
}

/// History endpoints answer with a bare array or `{messages: [...]}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum HistoryEnvelope {
    /// `[...]`
    List(Vec<WireMessage>),
    /// `{messages: [...]}`
    Wrapped {
        /// Messages, oldest first.
        messages: Vec<WireMessage>,
    },
}

impl HistoryEnvelope {
    /// Messages, oldest first.
    pub fn into_messages(self) -> Vec<Message> {
        let (Self::List(list) | Self::Wrapped { messages: list }) = self;
        list.into_iter().map(WireMessage::into_message).collect()
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{detail}`, `{message}` and `{error}`; FastAPI validation
/// errors (`{detail: [{msg}]}`) yield the first `msg`. Falls back to the raw
/// body.
pub fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    let pick = |key: &str| match value.get(key) {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Array(items)) => items
            .first()
            .and_then(|i| i.get("msg"))
            .and_then(serde_json::Value::as_str)
            .map(String::from),
        _ => None,
    };
    pick("detail")
        .or_else(|| pick("message"))
        .or_else(|| pick("error"))
        .unwrap_or_else(|| body.trim().to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{SessionId, Sender};
    use serde_json::json;

    #[test]
    fn login_accepts_either_token_key() {
        let a: LoginResponse =
            serde_json::from_value(json!({"access_token": "a", "token_type": "bearer"})).unwrap();
        let b: LoginResponse =
            serde_json::from_value(json!({"token": "b", "user": {"email": "x@y.z"}})).unwrap();
        assert_eq!(a.access_token, "a");
        assert!(a.user.is_none());
        assert_eq!(b.access_token, "b");
        assert_eq!(b.user.unwrap().email, "x@y.z");
    }

    #[test]
    fn chat_request_shape() {
        let id = SessionId::from_int(4);
        let v = serde_json::to_value(ChatRequest {
            session_id: &id,
            text: "hi",
        })
        .unwrap();
        assert_eq!(v, json!({"session_id": 4, "text": "hi"}));
    }

    #[test]
    fn chat_reply_shapes() {
        let r: ChatReply = serde_json::from_value(json!({"reply": "pong"})).unwrap();
        assert_eq!(r.into_message().text, "pong");
        let r: ChatReply = serde_json::from_value(
            json!({"message": {"content": "pong", "sender": "assistant"}, "session_id": "s"}),
        )
        .unwrap();
        let m = r.into_message();
        assert_eq!(m.text, "pong");
        assert_eq!(m.sender, Sender::Bot);
    }

    #[test]
    fn session_envelopes() {
        let s: SessionEnvelope = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(
            s.into_inner().into_session().unwrap().id,
            SessionId::from_int(7)
        );
        let s: SessionEnvelope =
            serde_json::from_value(json!({"session": {"session_id": "abc"}})).unwrap();
        assert_eq!(
            s.into_inner().into_session().unwrap().id,
            SessionId::from("abc")
        );
    }

    #[test]
    fn history_envelopes() {
        let h: HistoryEnvelope = serde_json::from_value(json!([
            {"content": "q", "sender": "user"},
            {"content": "a", "sender": "bot"}
        ]))
        .unwrap();
        let msgs = h.into_messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].sender, Sender::User);

        let h: HistoryEnvelope =
            serde_json::from_value(json!({"messages": [{"text": "a"}], "total": 1})).unwrap();
        assert_eq!(h.into_messages()[0].text, "a");
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(error_message(r#"{"detail": "Incorrect email"}"#), "Incorrect email");
        assert_eq!(
            error_message(r#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#),
            "field required"
        );
        assert_eq!(error_message(r#"{"error": "nope"}"#), "nope");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
