//! Error hierarchy for the Parley client.
//!
//! - [`ParleyError`]: top-level enum covering every error domain
//! - [`AuthError`]: login/register rejections and client-side validation
//! - [`TransportError`]: HTTP and WebSocket failures
//! - [`SessionError`]: session lifecycle failures
//! - [`SyncError`]: offline replay failures
//! - [`InputError`]: user input rejected before sending
//!
//! [`ParleyError::is_connectivity`] decides whether a failed mutating call is
//! deferred to the offline log instead of being reported.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias.
pub type Result<T, E = ParleyError> = std::result::Result<T, E>;

// ─────────────────────────────────────────────────────────────────────────────
// ErrorCategory
// ─────────────────────────────────────────────────────────────────────────────

/// Coarse classification used for logging and user-facing rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Credentials rejected or missing.
    Authentication,
    /// The backend could not be reached.
    Network,
    /// The backend answered with a server-side failure.
    Server,
    /// The backend rejected the request as malformed.
    Client,
    /// No usable session.
    Session,
    /// Input rejected locally.
    Input,
    /// Local persistence failed.
    Storage,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Authentication => "authentication",
            Self::Network => "network",
            Self::Server => "server",
            Self::Client => "client",
            Self::Session => "session",
            Self::Input => "input",
            Self::Storage => "storage",
        };
        f.write_str(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ParleyError
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level error type.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Authentication error.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Session error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Offline replay error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Input rejected before sending.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Local storage error.
    #[error("storage error: {message}")]
    Storage {
        /// Description.
        message: String,
    },
}

impl ParleyError {
    /// Create a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Error category for classification.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Transport(e) => e.category(),
            Self::Session(_) => ErrorCategory::Session,
            Self::Sync(e) => e.source.category(),
            Self::Input(_) => ErrorCategory::Input,
            Self::Storage { .. } => ErrorCategory::Storage,
        }
    }

    /// Whether the failure means the backend is unreachable.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connectivity(),
            Self::Sync(e) => e.source.is_connectivity(),
            _ => false,
        }
    }

    /// Whether the backend rejected the stored credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Auth(AuthError::Rejected { status, .. }) => *status == 401,
            Self::Auth(AuthError::NotAuthenticated) => true,
            Self::Transport(TransportError::Status { status, .. }) => *status == 401,
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AuthError
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The backend rejected the credentials.
    #[error("authentication failed ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Backend-provided detail.
        message: String,
    },

    /// No stored token.
    #[error("not logged in")]
    NotAuthenticated,

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Password shorter than the minimum.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum length.
        min: usize,
    },

    /// Email missing or obviously malformed.
    #[error("invalid email address")]
    InvalidEmail,
}

// ─────────────────────────────────────────────────────────────────────────────
// TransportError
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP and WebSocket failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Could not establish a connection.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The duplex connection is closed.
    #[error("connection closed")]
    Closed,

    /// The request exceeded its timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Backend-provided detail.
        message: String,
    },

    /// Writing a frame or request body failed.
    #[error("send failed: {0}")]
    Send(String),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// Whether the failure means the backend is unreachable.
    ///
    /// Gateway statuses (502, 503, 504) count as unreachable.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Closed | Self::Timeout { .. } | Self::Send(_) => true,
            Self::Status { status, .. } => matches!(status, 502..=504),
            Self::Decode(_) | Self::Shutdown => false,
        }
    }

    /// Error category for classification.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Status { status, .. } if *status == 401 || *status == 403 => {
                ErrorCategory::Authentication
            }
            Self::Status { status, .. } if (400..500).contains(status) => ErrorCategory::Client,
            Self::Status { .. } | Self::Decode(_) => ErrorCategory::Server,
            _ => ErrorCategory::Network,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionError
// ─────────────────────────────────────────────────────────────────────────────

/// Session lifecycle failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No session is bound, so nothing can be sent.
    #[error("no active session")]
    NoActiveSession,

    /// The backend response carried no session id.
    #[error("backend returned a session without an id")]
    MissingId,
}

// ─────────────────────────────────────────────────────────────────────────────
// SyncError
// ─────────────────────────────────────────────────────────────────────────────

/// An offline action failed during replay.
#[derive(Debug, Error)]
#[error("replay of {method} {endpoint} failed: {source}")]
pub struct SyncError {
    /// Endpoint of the failed action.
    pub endpoint: String,
    /// Method of the failed action.
    pub method: String,
    /// Underlying failure.
    pub source: Box<ParleyError>,
}

// ─────────────────────────────────────────────────────────────────────────────
// InputError
// ─────────────────────────────────────────────────────────────────────────────

/// User input rejected before it reaches the transport.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// Nothing but whitespace.
    #[error("message is empty")]
    Empty,

    /// Over the configured character limit.
    #[error("message is {len} characters; the limit is {max}")]
    TooLong {
        /// Submitted length.
        len: usize,
        /// Limit.
        max: usize,
    },

    /// A reply is still outstanding.
    #[error("still waiting for the previous reply")]
    Busy,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
