//! Backend HTTP API.
//!
//! [`ChatApi`] is the seam between the client and the backend; the
//! production implementation is [`HttpChatApi`] on `reqwest`.

mod http;
pub mod types;

pub use http::HttpChatApi;
pub use types::{ChatReply, LoginResponse};

use async_trait::async_trait;
use parley_core::{Message, PendingAction, Result, Session, SessionId, User};
use serde_json::Value;

/// Registration form as typed by the user.
#[derive(Clone, Debug, Default)]
pub struct RegisterForm {
    /// Account email.
    pub email: String,
    /// Optional display name.
    pub username: Option<String>,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm: String,
}

/// Backend operations used by the client.
///
/// Implementations attach the current bearer token (see
/// [`ChatApi::set_token`]) to every authenticated call.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Replace the bearer token used for subsequent calls.
    fn set_token(&self, token: Option<String>);

    /// Exchange credentials for a token.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;

    /// Create an account.
    async fn register(&self, form: &RegisterForm) -> Result<()>;

    /// The authenticated user.
    async fn current_user(&self) -> Result<User>;

    /// Open a fresh server-side session.
    async fn create_session(&self) -> Result<Session>;

    /// The caller's current session, if the backend has one.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Messages of a session, oldest first.
    async fn history(&self, id: &SessionId) -> Result<Vec<Message>>;

    /// Send a chat message and wait for the reply.
    async fn send_message(&self, session_id: &SessionId, text: &str) -> Result<Message>;

    /// `GET` an arbitrary JSON resource.
    async fn get_json(&self, path: &str) -> Result<Value>;

    /// Perform a mutating call.
    async fn execute(&self, action: &PendingAction) -> Result<Value>;

    /// Absolute URL of an endpoint path.
    fn url(&self, path: &str) -> String;
}

/// Substitute `{name}` placeholders in an endpoint template.
pub fn expand(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
