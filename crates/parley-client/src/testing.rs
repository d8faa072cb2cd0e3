//! In-memory doubles for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use parley_core::{
    AuthError, Message, PendingAction, Result, Session, SessionId, TransportError, User,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::api::{ChatApi, LoginResponse, RegisterForm};
use crate::transport::{Connector, Link};

// ─────────────────────────────────────────────────────────────────────────────
// MockApi
// ─────────────────────────────────────────────────────────────────────────────

enum ReplyMode {
    Text(String),
    Hang,
    Fail(TransportError),
}

struct MockState {
    json: HashMap<String, Value>,
    get_calls: usize,
    token: Option<String>,
    login: Option<LoginResponse>,
    user: Option<User>,
    registered: Vec<RegisterForm>,
    next_sessions: VecDeque<Session>,
    create_calls: usize,
    current: Option<Session>,
    history: Vec<Message>,
    reply: ReplyMode,
    sent: Vec<(SessionId, String)>,
    executed: Vec<PendingAction>,
    failing: HashMap<String, TransportError>,
}

/// Scriptable [`ChatApi`].
///
/// Unknown `GET` paths fail with 404; `create_session` fails with a
/// connection error once its scripted sessions run out.
pub(crate) struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                json: HashMap::new(),
                get_calls: 0,
                token: None,
                login: None,
                user: None,
                registered: Vec::new(),
                next_sessions: VecDeque::new(),
                create_calls: 0,
                current: None,
                history: Vec::new(),
                reply: ReplyMode::Text("ok".into()),
                sent: Vec::new(),
                executed: Vec::new(),
                failing: HashMap::new(),
            }),
        }
    }

    pub(crate) fn set_json(&self, path: &str, value: Value) {
        let _ = self.state.lock().json.insert(path.to_string(), value);
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.state.lock().get_calls
    }

    pub(crate) fn accept_login(&self, token: &str, user: User) {
        let mut state = self.state.lock();
        state.login = Some(LoginResponse {
            access_token: token.to_string(),
            user: Some(user.clone()),
        });
        state.user = Some(user);
    }

    pub(crate) fn set_user(&self, user: Option<User>) {
        self.state.lock().user = user;
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.state.lock().token.clone()
    }

    pub(crate) fn registered(&self) -> Vec<RegisterForm> {
        self.state.lock().registered.clone()
    }

    pub(crate) fn push_session(&self, id: i64) {
        self.state
            .lock()
            .next_sessions
            .push_back(Session::new(SessionId::from_int(id)));
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.state.lock().create_calls
    }

    pub(crate) fn set_current_session(&self, id: Option<i64>) {
        self.state.lock().current = id.map(|id| Session::new(SessionId::from_int(id)));
    }

    pub(crate) fn set_history(&self, messages: Vec<Message>) {
        self.state.lock().history = messages;
    }

    pub(crate) fn set_reply(&self, text: &str) {
        self.state.lock().reply = ReplyMode::Text(text.to_string());
    }

    pub(crate) fn hang_replies(&self) {
        self.state.lock().reply = ReplyMode::Hang;
    }

    pub(crate) fn fail_replies(&self, error: TransportError) {
        self.state.lock().reply = ReplyMode::Fail(error);
    }

    pub(crate) fn sent_messages(&self) -> Vec<(SessionId, String)> {
        self.state.lock().sent.clone()
    }

    /// Make `execute` on `endpoint` fail with `error` until cleared.
    pub(crate) fn fail_endpoint(&self, endpoint: &str, error: TransportError) {
        let _ = self.state.lock().failing.insert(endpoint.to_string(), error);
    }

    pub(crate) fn heal_endpoint(&self, endpoint: &str) {
        let _ = self.state.lock().failing.remove(endpoint);
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.state
            .lock()
            .executed
            .iter()
            .map(|a| format!("{} {}", a.method, a.endpoint))
            .collect()
    }
}

fn unauthorized() -> TransportError {
    TransportError::Status {
        status: 401,
        message: "Could not validate credentials".into(),
    }
}

#[async_trait]
impl ChatApi for MockApi {
    fn set_token(&self, token: Option<String>) {
        self.state.lock().token = token;
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<LoginResponse> {
        self.state.lock().login.clone().ok_or_else(|| {
            AuthError::Rejected {
                status: 401,
                message: "Incorrect email or password".into(),
            }
            .into()
        })
    }

    async fn register(&self, form: &RegisterForm) -> Result<()> {
        self.state.lock().registered.push(form.clone());
        Ok(())
    }

    async fn current_user(&self) -> Result<User> {
        self.state
            .lock()
            .user
            .clone()
            .ok_or_else(|| unauthorized().into())
    }

    async fn create_session(&self) -> Result<Session> {
        let mut state = self.state.lock();
        state.create_calls += 1;
        let session = state
            .next_sessions
            .pop_front()
            .ok_or_else(|| TransportError::Connect("connection refused".into()))?;
        state.current = Some(session.clone());
        Ok(session)
    }

    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.state.lock().current.clone())
    }

    async fn history(&self, _id: &SessionId) -> Result<Vec<Message>> {
        Ok(self.state.lock().history.clone())
    }

    async fn send_message(&self, session_id: &SessionId, text: &str) -> Result<Message> {
        let outcome = {
            let mut state = self.state.lock();
            state.sent.push((session_id.clone(), text.to_string()));
            match &state.reply {
                ReplyMode::Text(reply) => Some(Ok(Message::bot(reply.clone()))),
                ReplyMode::Fail(e) => Some(Err(e.clone().into())),
                ReplyMode::Hang => None,
            }
        };
        match outcome {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let mut state = self.state.lock();
        state.get_calls += 1;
        state.json.get(path).cloned().ok_or_else(|| {
            TransportError::Status {
                status: 404,
                message: "Not Found".into(),
            }
            .into()
        })
    }

    async fn execute(&self, action: &PendingAction) -> Result<Value> {
        let mut state = self.state.lock();
        if let Some(error) = state.failing.get(&action.endpoint) {
            return Err(error.clone().into());
        }
        state.executed.push(action.clone());
        Ok(Value::Null)
    }

    fn url(&self, path: &str) -> String {
        format!("http://mock/api{path}")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordingLink
// ─────────────────────────────────────────────────────────────────────────────

/// [`Link`] that records sends and optionally fails after `fail_after` of
/// them.
#[derive(Default)]
pub(crate) struct RecordingLink {
    pub(crate) sent: Vec<String>,
    fail_after: Option<usize>,
}

impl RecordingLink {
    pub(crate) fn failing_at(n: usize) -> Self {
        Self {
            sent: Vec::new(),
            fail_after: Some(n),
        }
    }
}

#[async_trait]
impl Link for RecordingLink {
    async fn send(&mut self, text: String) -> std::result::Result<(), TransportError> {
        if self.fail_after.is_some_and(|n| self.sent.len() >= n) {
            return Err(TransportError::Closed);
        }
        self.sent.push(text);
        Ok(())
    }

    async fn recv(&mut self) -> Option<std::result::Result<String, TransportError>> {
        std::future::pending().await
    }

    async fn close(&mut self) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// MockConnector
// ─────────────────────────────────────────────────────────────────────────────

/// The far end of a [`MockConnector`] link.
pub(crate) struct MockPeer {
    sent: mpsc::UnboundedReceiver<String>,
    push: Option<mpsc::UnboundedSender<String>>,
}

impl MockPeer {
    /// Next frame the client transmitted.
    pub(crate) async fn next_sent(&mut self) -> Option<String> {
        self.sent.recv().await
    }

    /// Deliver an inbound frame to the client.
    pub(crate) fn push(&self, text: &str) {
        if let Some(push) = &self.push {
            let _ = push.send(text.to_string());
        }
    }

    /// Close the inbound side; the client sees the peer hang up.
    pub(crate) fn hang_up(&mut self) {
        self.push = None;
    }
}

/// [`Connector`] following a script of accept/refuse outcomes (accepting
/// once the script runs out). Each accepted link's peer is handed to the
/// test through a channel.
pub(crate) struct MockConnector {
    script: Mutex<VecDeque<bool>>,
    attempts: Mutex<Vec<Instant>>,
    peers: mpsc::UnboundedSender<MockPeer>,
}

impl MockConnector {
    pub(crate) fn new(
        script: impl IntoIterator<Item = bool>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<MockPeer>) {
        let (peers, peers_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            attempts: Mutex::new(Vec::new()),
            peers,
        });
        (connector, peers_rx)
    }

    /// When each connect attempt happened.
    pub(crate) fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> std::result::Result<Box<dyn Link>, TransportError> {
        self.attempts.lock().push(Instant::now());
        let accept = self.script.lock().pop_front().unwrap_or(true);
        if !accept {
            return Err(TransportError::Connect("connection refused".into()));
        }
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let _ = self.peers.send(MockPeer {
            sent: sent_rx,
            push: Some(push_tx),
        });
        Ok(Box::new(MockLink {
            sent: sent_tx,
            inbound: push_rx,
        }))
    }
}

struct MockLink {
    sent: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl Link for MockLink {
    async fn send(&mut self, text: String) -> std::result::Result<(), TransportError> {
        self.sent.send(text).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<std::result::Result<String, TransportError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) {}
}
