//! Chat controller.
//!
//! Owns the client state and every stateful component (API client, store,
//! session manager, offline log, request cache, transport). Front-ends call
//! its operations and feed [`ChatController::next_event`] results back into
//! [`ChatController::handle`]; both return [`Render`] lists.
//!
//! Network failures during chat are turned into renders (notices or
//! bot-styled error messages). Input, session and authentication errors are
//! returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use parley_core::{
    ActionMethod, AuthError, ClientFrame, ConnectionState, InputError, Message, PendingAction,
    Result, ServerFrame, TransportError, User,
};
use parley_settings::{ParleySettings, TransportMode};
use parley_store::{ClientStore, FileStore, Theme};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ChatApi, HttpChatApi, RegisterForm, expand};
use crate::auth::{validate_login, validate_registration};
use crate::cache::{RequestCache, RequestOptions};
use crate::offline::{OfflineLog, Outcome, SyncReport};
use crate::session::SessionManager;
use crate::state::{ClientEvent, ClientState, NoticeLevel, Render};
use crate::transport::{
    Connector, DuplexHandle, RequestTransport, TransportEvent, WsConnector, spawn_duplex,
};

/// Something the controller must react to.
#[derive(Debug)]
pub enum ControllerEvent {
    /// Emitted by the duplex supervisor.
    Transport(TransportEvent),
    /// A request-mode reply (or its failure) arrived.
    Reply {
        /// The submit it answers.
        ticket: ReplyTicket,
        /// Reply or failure.
        result: Result<Message>,
    },
}

/// Identifies one request-mode submit. Replies whose ticket is no longer
/// outstanding are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplyTicket(u64);

struct PendingReply {
    ticket: ReplyTicket,
    task: JoinHandle<()>,
}

enum ActiveTransport {
    Duplex(DuplexHandle),
    Request(RequestTransport),
}

/// Single owner of the client state.
pub struct ChatController {
    settings: ParleySettings,
    api: Arc<dyn ChatApi>,
    store: Arc<dyn ClientStore>,
    sessions: SessionManager,
    offline: OfflineLog,
    cache: RequestCache,
    state: ClientState,
    transport: Option<ActiveTransport>,
    transport_events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    replies_tx: mpsc::UnboundedSender<(ReplyTicket, Result<Message>)>,
    replies_rx: mpsc::UnboundedReceiver<(ReplyTicket, Result<Message>)>,
    pending_reply: Option<PendingReply>,
    tickets: u64,
    connector: Option<Arc<dyn Connector>>,
}

impl ChatController {
    /// Controller over explicit components. The stored token, if any, is
    /// handed to `api`.
    pub fn new(
        settings: ParleySettings,
        api: Arc<dyn ChatApi>,
        store: Arc<dyn ClientStore>,
    ) -> Self {
        let doc = store.load();
        api.set_token(doc.token.clone());
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Self {
            sessions: SessionManager::new(Arc::clone(&api)),
            offline: OfflineLog::new(Arc::clone(&store)),
            cache: RequestCache::from_settings(&settings.cache),
            state: ClientState::new(doc.theme, doc.notifications),
            settings,
            api,
            store,
            transport: None,
            transport_events: None,
            replies_tx,
            replies_rx,
            pending_reply: None,
            tickets: 0,
            connector: None,
        }
    }

    /// Controller talking HTTP to `settings.api` and persisting to
    /// `settings.store_path()`.
    pub fn from_settings(settings: ParleySettings) -> Result<Self> {
        let api = Arc::new(HttpChatApi::new(&settings.api)?);
        let store = Arc::new(FileStore::new(settings.store_path()));
        Ok(Self::new(settings, api, store))
    }

    /// Dial duplex links through `connector` instead of the WebSocket URL.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Current view state.
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Effective settings.
    pub fn settings(&self) -> &ParleySettings {
        &self.settings
    }

    /// Whether a token is stored.
    pub fn has_token(&self) -> bool {
        self.store.token().is_some()
    }

    /// Duplex connection state, or `Closed` when not in duplex mode.
    pub fn connection(&self) -> ConnectionState {
        match &self.transport {
            Some(ActiveTransport::Duplex(handle)) => handle.state(),
            _ => ConnectionState::Closed,
        }
    }

    // ── Authentication ──────────────────────────────────────────────────

    /// Log in and persist the token.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Vec<Render>> {
        validate_login(email, password)?;
        let response = self.api.login(email, password).await?;
        self.store.set_token(Some(response.access_token.clone()))?;
        self.api.set_token(Some(response.access_token));
        let user = match response.user {
            Some(user) => user,
            None => self.api.current_user().await?,
        };
        info!(email = %user.email, "logged in");
        Ok(self.state.apply(ClientEvent::LoggedIn(user)))
    }

    /// Create an account. Does not log in.
    pub async fn register(&mut self, form: &RegisterForm) -> Result<Vec<Render>> {
        validate_registration(form, self.settings.chat.min_password_chars)?;
        self.api.register(form).await?;
        info!(email = %form.email, "registered");
        Ok(self.state.apply(ClientEvent::Notice(
            NoticeLevel::Success,
            "Registration successful. Please log in.".into(),
        )))
    }

    /// Verify the stored token. A rejected token is discarded; other
    /// failures leave it in place.
    pub async fn restore(&mut self) -> Result<Vec<Render>> {
        let Some(token) = self.store.token() else {
            return Ok(Vec::new());
        };
        self.api.set_token(Some(token));
        match self.api.current_user().await {
            Ok(user) => Ok(self.state.apply(ClientEvent::LoggedIn(user))),
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "stored token rejected; discarding");
                self.store.set_token(None)?;
                self.api.set_token(None);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// The authenticated user, fetched from the backend.
    pub async fn whoami(&self) -> Result<User> {
        if !self.has_token() {
            return Err(AuthError::NotAuthenticated.into());
        }
        self.api.current_user().await
    }

    /// Discard token, session and transcript, and stop the transport.
    pub async fn logout(&mut self) -> Result<Vec<Render>> {
        self.stop_transport().await;
        self.store.set_token(None)?;
        self.api.set_token(None);
        self.cache.clear();
        let _ = self.sessions.clear_session();
        info!("logged out");
        Ok(self.state.apply(ClientEvent::LoggedOut))
    }

    // ── Chat ────────────────────────────────────────────────────────────

    /// Bind a session (loading its history) and start the configured
    /// transport.
    pub async fn start_chat(&mut self) -> Result<Vec<Render>> {
        let Some(token) = self.store.token() else {
            return Err(AuthError::NotAuthenticated.into());
        };
        self.stop_transport().await;
        let mode = self.settings.transport.mode;
        info!(%mode, "starting chat");

        let mut out = Vec::new();
        match mode {
            TransportMode::Duplex => {
                let connector = match &self.connector {
                    Some(connector) => Arc::clone(connector),
                    None => Arc::new(WsConnector::new(
                        &self.settings.api.ws_url,
                        Some(&token),
                        Duration::from_millis(self.settings.api.request_timeout_ms),
                    )?),
                };
                let (handle, events) =
                    spawn_duplex(connector, self.settings.transport.reconnect.clone());
                self.transport = Some(ActiveTransport::Duplex(handle));
                self.transport_events = Some(events);
            }
            TransportMode::Request => {
                let timeout = Duration::from_millis(self.settings.api.request_timeout_ms);
                self.transport = Some(ActiveTransport::Request(RequestTransport::new(
                    Arc::clone(&self.api),
                    timeout,
                )));
            }
        }

        let loaded = match self.sessions.load_session().await {
            Ok(session) => session.cloned(),
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => {
                warn!(error = %e, "could not load current session");
                None
            }
        };
        match loaded {
            Some(session) => {
                out.extend(self.state.apply(ClientEvent::SessionBound(session)));
                out.extend(self.load_history().await);
            }
            // The server opens a session on connect and announces it with
            // `session_created`.
            None if mode == TransportMode::Duplex => {
                debug!("waiting for the server to announce a session");
            }
            None => out.extend(self.open_session().await),
        }
        Ok(out)
    }

    /// Bind the backend's current session and load its history without
    /// starting a transport. Never creates a session.
    pub async fn resume(&mut self) -> Result<Vec<Render>> {
        if !self.has_token() {
            return Err(AuthError::NotAuthenticated.into());
        }
        let Some(session) = self.sessions.load_session().await? else {
            return Ok(Vec::new());
        };
        let session = session.clone();
        let mut out = self.state.apply(ClientEvent::SessionBound(session));
        out.extend(self.load_history().await);
        Ok(out)
    }

    /// Send a typed message.
    ///
    /// Blank input is ignored. Over-long input, a missing session and an
    /// outstanding request-mode reply are errors.
    pub fn submit(&mut self, text: &str) -> Result<Vec<Render>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let len = text.chars().count();
        let max = self.settings.chat.max_message_chars;
        if len > max {
            return Err(InputError::TooLong { len, max }.into());
        }
        if self.state.busy {
            return Err(InputError::Busy.into());
        }
        let session_id = self.sessions.require()?.clone();

        match &self.transport {
            Some(ActiveTransport::Duplex(handle)) => {
                handle.send(ClientFrame::user_message(text, Some(session_id)))?;
                Ok(self.state.apply(ClientEvent::MessageSubmitted(Message::user(text))))
            }
            Some(ActiveTransport::Request(transport)) => {
                let transport = transport.clone();
                let replies = self.replies_tx.clone();
                let owned = text.to_string();
                self.tickets += 1;
                let ticket = ReplyTicket(self.tickets);
                let task = tokio::spawn(async move {
                    let result = transport.send(&session_id, &owned).await;
                    let _ = replies.send((ticket, result));
                });
                self.pending_reply = Some(PendingReply { ticket, task });
                let mut out = self.state.apply(ClientEvent::MessageSubmitted(Message::user(text)));
                out.extend(self.state.apply(ClientEvent::ReplyPending));
                Ok(out)
            }
            None => Err(TransportError::Closed.into()),
        }
    }

    /// Clear the transcript and bind a fresh session.
    pub async fn new_session(&mut self) -> Result<Vec<Render>> {
        let mut out = self.abandon_reply();
        out.extend(self.state.apply(ClientEvent::ChatCleared));
        let _ = self.sessions.clear_session();
        out.extend(self.state.apply(ClientEvent::SessionCleared));
        out.extend(self.open_session().await);
        Ok(out)
    }

    /// Clear the local transcript only.
    pub fn clear_chat(&mut self) -> Vec<Render> {
        self.state.apply(ClientEvent::ChatCleared)
    }

    /// Reload the bound session's history.
    pub async fn history(&mut self) -> Result<Vec<Message>> {
        let messages = self.sessions.history().await?;
        let _ = self
            .state
            .apply(ClientEvent::HistoryLoaded(messages.clone()));
        Ok(messages)
    }

    /// Skip the reconnect delay (duplex only).
    pub fn reconnect_now(&self) -> Result<()> {
        if let Some(ActiveTransport::Duplex(handle)) = &self.transport {
            handle.reconnect_now()?;
        }
        Ok(())
    }

    /// Next event to [`handle`](Self::handle). Pends forever when nothing
    /// can produce one.
    pub async fn next_event(&mut self) -> ControllerEvent {
        let replies = &mut self.replies_rx;
        let events = self.transport_events.as_mut();
        let transport = async move {
            match events {
                Some(events) => events.recv().await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            Some((ticket, result)) = replies.recv() => ControllerEvent::Reply { ticket, result },
            Some(event) = transport => ControllerEvent::Transport(event),
            else => std::future::pending().await,
        }
    }

    /// React to an event.
    pub async fn handle(&mut self, event: ControllerEvent) -> Vec<Render> {
        match event {
            ControllerEvent::Reply { ticket, result } => self.handle_reply(ticket, result),
            ControllerEvent::Transport(event) => self.handle_transport(event).await,
        }
    }

    fn handle_reply(&mut self, ticket: ReplyTicket, result: Result<Message>) -> Vec<Render> {
        if self.pending_reply.as_ref().is_none_or(|p| p.ticket != ticket) {
            debug!(?ticket, "dropping reply to an abandoned request");
            return Vec::new();
        }
        self.pending_reply = None;
        match result {
            Ok(message) => self.state.apply(ClientEvent::BotReplied(message)),
            Err(e) => {
                warn!(error = %e, "chat request failed");
                self.state.apply(ClientEvent::SendFailed(e.to_string()))
            }
        }
    }

    async fn handle_transport(&mut self, event: TransportEvent) -> Vec<Render> {
        match event {
            TransportEvent::State(state) => {
                let mut out = self.state.apply(ClientEvent::Connection(state));
                if state == ConnectionState::Open {
                    let (_, renders) = self.sync().await;
                    out.extend(renders);
                }
                out
            }
            TransportEvent::Frame(frame) => self.handle_frame(frame),
            TransportEvent::Queued { pending } => self.state.apply(ClientEvent::Queued { pending }),
            TransportEvent::Flushed(report) => {
                if let Some(e) = &report.error {
                    debug!(error = %e, "flush interrupted");
                }
                self.state.apply(ClientEvent::Flushed {
                    sent: report.sent,
                    remaining: report.remaining,
                })
            }
            TransportEvent::GaveUp { attempts } => self.state.apply(ClientEvent::Notice(
                NoticeLevel::Error,
                format!("Could not reconnect after {attempts} attempts"),
            )),
        }
    }

    fn handle_frame(&mut self, frame: ServerFrame) -> Vec<Render> {
        match frame {
            ServerFrame::SessionCreated { session } => match session.into_session() {
                Some(session) => {
                    self.sessions.bind(session.clone());
                    self.state.apply(ClientEvent::SessionBound(session))
                }
                None => {
                    warn!("session_created frame without an id");
                    Vec::new()
                }
            },
            ServerFrame::BotTyping => self.state.apply(ClientEvent::BotTyping),
            ServerFrame::BotResponse { message } => {
                self.state.apply(ClientEvent::BotReplied(message.into_message()))
            }
            ServerFrame::Error { message } => self.state.apply(ClientEvent::ServerError(message)),
            ServerFrame::Unknown => Vec::new(),
        }
    }

    // ── Offline actions ─────────────────────────────────────────────────

    /// Replay the offline log.
    pub async fn sync(&mut self) -> (SyncReport, Vec<Render>) {
        let report = self.offline.sync(self.api.as_ref()).await;
        let renders = self.state.apply(ClientEvent::Synced {
            replayed: report.replayed,
            remaining: report.remaining,
        });
        (report, renders)
    }

    /// Number of logged offline actions.
    pub fn pending_actions(&self) -> usize {
        self.offline.len()
    }

    /// Reading lists, served from the request cache when fresh.
    pub async fn lists(&mut self) -> Result<Value> {
        let path = self.settings.api.endpoints.lists.clone();
        self.cache
            .fetch(self.api.as_ref(), &path, &RequestOptions::authed_get())
            .await
    }

    /// Add a book to a reading list, deferring it if offline.
    pub async fn add_to_list(&mut self, list: &str, book_id: &str) -> Result<Outcome> {
        let endpoint = expand(&self.settings.api.endpoints.list_add, &[("list", list)]);
        let payload = json!({ "bookId": book_value(book_id) });
        let action = PendingAction::new(endpoint, ActionMethod::Post, Some(payload));
        self.offline.call_or_defer(self.api.as_ref(), action).await
    }

    /// Remove a book from a reading list, deferring it if offline.
    pub async fn remove_from_list(&mut self, list: &str, book_id: &str) -> Result<Outcome> {
        let endpoint = expand(
            &self.settings.api.endpoints.list_remove,
            &[("list", list), ("book", book_id)],
        );
        let action = PendingAction::new(endpoint, ActionMethod::Delete, None);
        self.offline.call_or_defer(self.api.as_ref(), action).await
    }

    // ── Preferences ─────────────────────────────────────────────────────

    /// Persist and apply the colour theme.
    pub fn set_theme(&mut self, theme: Theme) -> Result<Vec<Render>> {
        self.store.set_theme(theme)?;
        let notifications = self.state.notifications;
        Ok(self.state.apply(ClientEvent::PreferencesChanged {
            theme,
            notifications,
        }))
    }

    /// Persist and apply the notifications preference.
    pub fn set_notifications(&mut self, enabled: bool) -> Result<Vec<Render>> {
        self.store.set_notifications(enabled)?;
        let theme = self.state.theme;
        Ok(self.state.apply(ClientEvent::PreferencesChanged {
            theme,
            notifications: enabled,
        }))
    }

    /// Stop the transport and wait for it to wind down.
    pub async fn shutdown(&mut self) {
        self.stop_transport().await;
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Request a fresh session: over the socket in duplex mode (bound when
    /// `session_created` arrives), over HTTP otherwise.
    async fn open_session(&mut self) -> Vec<Render> {
        if let Some(ActiveTransport::Duplex(handle)) = &self.transport {
            if handle.send(ClientFrame::CreateSession).is_ok() {
                debug!("session requested over duplex link");
                return Vec::new();
            }
        }
        match self.sessions.create_session().await {
            Ok(session) => {
                let session = session.clone();
                self.state.apply(ClientEvent::SessionBound(session))
            }
            Err(e) => self.state.apply(ClientEvent::Notice(
                NoticeLevel::Error,
                format!("Could not start a session: {e}"),
            )),
        }
    }

    async fn load_history(&mut self) -> Vec<Render> {
        match self.sessions.history().await {
            Ok(messages) => self.state.apply(ClientEvent::HistoryLoaded(messages)),
            Err(e) => {
                warn!(error = %e, "could not load history");
                Vec::new()
            }
        }
    }

    /// Cancel the outstanding request-mode reply, if any.
    fn abandon_reply(&mut self) -> Vec<Render> {
        let Some(pending) = self.pending_reply.take() else {
            return Vec::new();
        };
        pending.task.abort();
        info!(ticket = ?pending.ticket, "outstanding reply abandoned");
        self.state.apply(ClientEvent::ReplyAbandoned)
    }

    async fn stop_transport(&mut self) {
        let _ = self.abandon_reply();
        self.transport_events = None;
        if let Some(ActiveTransport::Duplex(handle)) = self.transport.take() {
            handle.join().await;
        }
        let _ = self.state.apply(ClientEvent::Connection(ConnectionState::Closed));
    }
}

/// Numeric book ids go out as JSON numbers.
fn book_value(book_id: &str) -> Value {
    book_id
        .parse::<i64>()
        .map_or_else(|_| Value::String(book_id.to_string()), Value::from)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
