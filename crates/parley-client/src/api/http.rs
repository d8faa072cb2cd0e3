//! `reqwest`-backed [`ChatApi`].

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use parley_core::{
    ActionMethod, AuthError, Message, ParleyError, PendingAction, Result, Session, SessionError,
    SessionId, TransportError, User,
};
use parley_settings::{ApiSettings, EndpointSettings};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::types::{
    ChatReply, ChatRequest, HistoryEnvelope, LoginRequest, LoginResponse, RegisterRequest,
    SessionEnvelope, error_message,
};
use super::{ChatApi, RegisterForm, expand};

/// HTTP client for the chat backend.
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
    endpoints: EndpointSettings,
    timeout_ms: u64,
    token: RwLock<Option<String>>,
}

impl HttpChatApi {
    /// Build a client from API settings.
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Connect(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            endpoints: settings.endpoints.clone(),
            timeout_ms: settings.request_timeout_ms,
            token: RwLock::new(None),
        })
    }

    async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self.client.request(method.clone(), self.url(path));
        let token = self.token.read().clone();
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, path, "api request");
        let response = request.send().await.map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            debug!(%method, path, status = status.as_u16(), "api request failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            }
            .into());
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()).into())
    }

    fn transport_error(&self, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Send(err.to_string())
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()).into())
}

fn to_json<T: serde::Serialize>(body: &T) -> Result<Value> {
    serde_json::to_value(body).map_err(|e| TransportError::Send(e.to_string()).into())
}

/// Turn credential rejections into [`AuthError::Rejected`].
fn as_auth_error(err: ParleyError) -> ParleyError {
    match err {
        ParleyError::Transport(TransportError::Status { status, message })
            if matches!(status, 400 | 401 | 403 | 409 | 422) =>
        {
            AuthError::Rejected { status, message }.into()
        }
        other => other,
    }
}

fn method_of(method: ActionMethod) -> Method {
    match method {
        ActionMethod::Post => Method::POST,
        ActionMethod::Put => Method::PUT,
        ActionMethod::Patch => Method::PATCH,
        ActionMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = to_json(&LoginRequest { email, password })?;
        let value = self
            .call(Method::POST, &self.endpoints.login, Some(&body))
            .await
            .map_err(as_auth_error)?;
        decode(value)
    }

    async fn register(&self, form: &RegisterForm) -> Result<()> {
        let body = to_json(&RegisterRequest {
            email: &form.email,
            password: &form.password,
            username: form.username.as_deref(),
        })?;
        let _ = self
            .call(Method::POST, &self.endpoints.register, Some(&body))
            .await
            .map_err(as_auth_error)?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User> {
        let value = self.call(Method::GET, &self.endpoints.me, None).await?;
        decode(value)
    }

    async fn create_session(&self) -> Result<Session> {
        let value = self
            .call(Method::POST, &self.endpoints.new_session, None)
            .await?;
        let envelope: SessionEnvelope = decode(value)?;
        envelope
            .into_inner()
            .into_session()
            .ok_or_else(|| SessionError::MissingId.into())
    }

    async fn current_session(&self) -> Result<Option<Session>> {
        let value = match self
            .call(Method::GET, &self.endpoints.current_session, None)
            .await
        {
            Ok(value) => value,
            Err(ParleyError::Transport(TransportError::Status { status: 404, .. })) => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if value.is_null() {
            return Ok(None);
        }
        let envelope: SessionEnvelope = decode(value)?;
        Ok(envelope.into_inner().into_session())
    }

    async fn history(&self, id: &SessionId) -> Result<Vec<Message>> {
        let path = expand(&self.endpoints.session_messages, &[("id", &id.to_string())]);
        let value = self.call(Method::GET, &path, None).await?;
        let envelope: HistoryEnvelope = decode(value)?;
        Ok(envelope.into_messages())
    }

    async fn send_message(&self, session_id: &SessionId, text: &str) -> Result<Message> {
        let body = to_json(&ChatRequest { session_id, text })?;
        let value = self
            .call(Method::POST, &self.endpoints.chat_message, Some(&body))
            .await?;
        let reply: ChatReply = decode(value)?;
        Ok(reply.into_message())
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        self.call(Method::GET, path, None).await
    }

    async fn execute(&self, action: &PendingAction) -> Result<Value> {
        self.call(
            method_of(action.method),
            &action.endpoint,
            action.payload.as_ref(),
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
