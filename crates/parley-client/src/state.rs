//! Client view state and its reducer.
//!
//! [`ClientState::apply`] is pure: it folds one [`ClientEvent`] into the
//! state and returns the [`Render`] instructions a front-end needs to bring
//! its view up to date. No I/O happens here.

use parley_core::{ConnectionState, Message, Session, User};
use parley_store::Theme;
use serde::{Deserialize, Serialize};

/// Severity of a transient notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something completed.
    Success,
    /// Degraded but working.
    Warning,
    /// Something failed.
    Error,
}

impl NoticeLevel {
    /// Whether the notifications preference can hide this notice.
    pub fn is_suppressible(self) -> bool {
        matches!(self, Self::Info | Self::Success)
    }
}

/// Something that happened to the client.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    /// Credentials accepted or a stored token verified.
    LoggedIn(User),
    /// Token and session discarded.
    LoggedOut,
    /// A session is now bound.
    SessionBound(Session),
    /// No session is bound any more.
    SessionCleared,
    /// History of the bound session arrived.
    HistoryLoaded(Vec<Message>),
    /// The user's own message was accepted for sending.
    MessageSubmitted(Message),
    /// A request-mode reply is outstanding.
    ReplyPending,
    /// The bot started composing.
    BotTyping,
    /// The bot's reply arrived.
    BotReplied(Message),
    /// The server reported an error frame.
    ServerError(String),
    /// Duplex connection state changed.
    Connection(ConnectionState),
    /// A message was buffered while offline.
    Queued {
        /// Messages waiting.
        pending: usize,
    },
    /// Buffered messages went out after reconnecting.
    Flushed {
        /// Messages delivered.
        sent: usize,
        /// Messages still buffered.
        remaining: usize,
    },
    /// A request-mode send failed.
    SendFailed(String),
    /// An outstanding request-mode reply was cancelled and will never
    /// arrive.
    ReplyAbandoned,
    /// Offline actions were replayed.
    Synced {
        /// Actions replayed.
        replayed: usize,
        /// Actions still logged.
        remaining: usize,
    },
    /// The local transcript was cleared. An outstanding reply stays
    /// outstanding.
    ChatCleared,
    /// A free-form notice.
    Notice(NoticeLevel, String),
    /// Preferences were changed.
    PreferencesChanged {
        /// Colour theme.
        theme: Theme,
        /// Whether info and success notices are shown.
        notifications: bool,
    },
}

/// Instruction for the view.
#[derive(Clone, Debug, PartialEq)]
pub enum Render {
    /// Append one message to the transcript.
    AppendMessage(Message),
    /// Replace the transcript.
    ReplaceMessages(Vec<Message>),
    /// Empty the transcript.
    ClearMessages,
    /// Show the typing placeholder.
    ShowTyping,
    /// Remove the typing placeholder.
    HideTyping,
    /// Show the connection state.
    Connection(ConnectionState),
    /// Show a transient notice.
    Notice {
        /// Severity.
        level: NoticeLevel,
        /// Text.
        text: String,
    },
    /// Enable (`false`) or disable (`true`) input.
    Busy(bool),
    /// Show the session label, or none.
    SessionLabel(Option<String>),
    /// Switch the colour theme.
    Theme(Theme),
}

/// Everything the view shows.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientState {
    /// Logged-in user.
    pub user: Option<User>,
    /// Bound session.
    pub session: Option<Session>,
    /// Transcript, oldest first.
    pub messages: Vec<Message>,
    /// Duplex connection state.
    pub connection: ConnectionState,
    /// Whether the typing placeholder is shown.
    pub typing: bool,
    /// Whether a request-mode reply is outstanding.
    pub busy: bool,
    /// Whether info and success notices are shown.
    pub notifications: bool,
    /// Colour theme.
    pub theme: Theme,
    recovering: bool,
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new(Theme::default(), true)
    }
}

impl ClientState {
    /// Empty state with the given preferences.
    pub fn new(theme: Theme, notifications: bool) -> Self {
        Self {
            user: None,
            session: None,
            messages: Vec::new(),
            connection: ConnectionState::Closed,
            typing: false,
            busy: false,
            notifications,
            theme,
            recovering: false,
        }
    }

    /// Fold `event` into the state.
    pub fn apply(&mut self, event: ClientEvent) -> Vec<Render> {
        let mut out = Vec::new();
        match event {
            ClientEvent::LoggedIn(user) => {
                let name = user.username.as_deref().unwrap_or(&user.email);
                let text = format!("Logged in as {name}");
                self.user = Some(user);
                self.notice(&mut out, NoticeLevel::Success, text);
            }
            ClientEvent::LoggedOut => {
                self.user = None;
                self.session = None;
                self.recovering = false;
                self.messages.clear();
                self.stop_waiting(&mut out);
                out.push(Render::ClearMessages);
                out.push(Render::SessionLabel(None));
                self.notice(&mut out, NoticeLevel::Info, "Logged out".into());
            }
            ClientEvent::SessionBound(session) => {
                out.push(Render::SessionLabel(Some(session.id.label())));
                self.session = Some(session);
            }
            ClientEvent::SessionCleared => {
                self.session = None;
                out.push(Render::SessionLabel(None));
            }
            ClientEvent::HistoryLoaded(messages) => {
                self.messages.clone_from(&messages);
                out.push(Render::ReplaceMessages(messages));
            }
            ClientEvent::MessageSubmitted(message) => {
                self.messages.push(message.clone());
                out.push(Render::AppendMessage(message));
            }
            ClientEvent::ReplyPending => {
                if !self.busy {
                    self.busy = true;
                    out.push(Render::Busy(true));
                }
            }
            ClientEvent::BotTyping => {
                if !self.typing {
                    self.typing = true;
                    out.push(Render::ShowTyping);
                }
            }
            ClientEvent::BotReplied(message) => {
                self.stop_waiting(&mut out);
                self.messages.push(message.clone());
                out.push(Render::AppendMessage(message));
            }
            ClientEvent::ServerError(text) => {
                self.stop_waiting(&mut out);
                self.notice(&mut out, NoticeLevel::Error, text);
            }
            ClientEvent::Connection(state) => self.connection_changed(&mut out, state),
            ClientEvent::Queued { pending } => {
                let text =
                    format!("Not connected; message queued ({pending} waiting). Reconnecting…");
                self.notice(&mut out, NoticeLevel::Warning, text);
            }
            ClientEvent::Flushed { sent, remaining } => {
                if remaining > 0 {
                    let text =
                        format!("Delivered {sent} queued message(s); {remaining} still waiting");
                    self.notice(&mut out, NoticeLevel::Warning, text);
                } else if sent > 0 {
                    let text = format!("Delivered {sent} queued message(s)");
                    self.notice(&mut out, NoticeLevel::Info, text);
                }
            }
            ClientEvent::SendFailed(reason) => {
                self.stop_waiting(&mut out);
                let message =
                    Message::bot(format!("Failed to send message: {reason}. Please try again."));
                self.messages.push(message.clone());
                out.push(Render::AppendMessage(message));
            }
            ClientEvent::Synced {
                replayed,
                remaining,
            } => {
                if replayed > 0 && remaining == 0 {
                    self.notice(&mut out, NoticeLevel::Success, "Data synchronized".into());
                }
            }
            ClientEvent::ReplyAbandoned => self.stop_waiting(&mut out),
            ClientEvent::ChatCleared => {
                self.messages.clear();
                if self.typing {
                    self.typing = false;
                    out.push(Render::HideTyping);
                }
                out.push(Render::ClearMessages);
            }
            ClientEvent::Notice(level, text) => self.notice(&mut out, level, text),
            ClientEvent::PreferencesChanged {
                theme,
                notifications,
            } => {
                self.notifications = notifications;
                if self.theme != theme {
                    self.theme = theme;
                    out.push(Render::Theme(theme));
                }
            }
        }
        out
    }

    fn connection_changed(&mut self, out: &mut Vec<Render>, state: ConnectionState) {
        let previous = self.connection;
        if previous == state {
            return;
        }
        self.connection = state;
        out.push(Render::Connection(state));
        match state {
            ConnectionState::Open if self.recovering => {
                self.recovering = false;
                self.notice(out, NoticeLevel::Success, "Connection restored".into());
            }
            ConnectionState::Reconnecting if !self.recovering => {
                self.recovering = true;
                self.notice(out, NoticeLevel::Warning, "Connection lost. Reconnecting…".into());
            }
            ConnectionState::Closed if self.typing => {
                self.typing = false;
                out.push(Render::HideTyping);
            }
            _ => {}
        }
    }

    fn stop_waiting(&mut self, out: &mut Vec<Render>) {
        if self.typing {
            self.typing = false;
            out.push(Render::HideTyping);
        }
        if self.busy {
            self.busy = false;
            out.push(Render::Busy(false));
        }
    }

    fn notice(&self, out: &mut Vec<Render>, level: NoticeLevel, text: String) {
        if level.is_suppressible() && !self.notifications {
            return;
        }
        out.push(Render::Notice { level, text });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
