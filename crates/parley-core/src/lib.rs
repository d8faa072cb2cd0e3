//! # parley-core
//!
//! Shared vocabulary for the Parley chat client.
//!
//! - **IDs**: [`SessionId`], [`MessageId`], [`UserId`] accept either integer or
//!   string ids from the backend and write integers back as integers
//! - **Model**: [`Session`], [`Message`], [`PendingAction`], [`ConnectionState`]
//! - **Frames**: [`ClientFrame`] / [`ServerFrame`] for the duplex JSON protocol
//! - **Errors**: [`ParleyError`] hierarchy via `thiserror`, with connectivity
//!   classification used to decide offline deferral
//! - **Reconnect**: [`ReconnectPolicy`] delay calculation

#![deny(unsafe_code)]

pub mod backoff;
pub mod errors;
pub mod frames;
pub mod ids;
pub mod model;
pub mod time;

pub use backoff::{ReconnectPolicy, ReconnectStrategy};
pub use errors::{
    AuthError, ErrorCategory, InputError, ParleyError, Result, SessionError, SyncError,
    TransportError,
};
pub use frames::{ClientFrame, ServerFrame, WireMessage, WireSession};
pub use ids::{MessageId, SessionId, UserId};
pub use model::{ActionMethod, ConnectionState, Message, PendingAction, Sender, Session, User};
