//! # parley-client
//!
//! Client core for the Parley chat backend.
//!
//! - [`api`]: backend HTTP API behind the [`ChatApi`] trait
//! - [`cache`]: five-minute request cache for idempotent reads
//! - [`session`]: session create/load/clear
//! - [`transport`]: duplex WebSocket supervisor with reconnect, and the
//!   request/response transport
//! - [`queue`]: in-memory delivery queue flushed in order on reconnect
//! - [`offline`]: persisted offline action log and its replay
//! - [`state`]: pure reducer from [`ClientEvent`] to [`Render`]
//! - [`controller`]: [`ChatController`], the single owner of client state

#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod cache;
pub mod controller;
pub mod offline;
pub mod queue;
pub mod session;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ChatApi, HttpChatApi, RegisterForm};
pub use cache::{RequestCache, RequestOptions};
pub use controller::{ChatController, ControllerEvent, ReplyTicket};
pub use offline::{OfflineLog, Outcome, SyncReport};
pub use queue::{DeliveryQueue, FlushReport};
pub use session::SessionManager;
pub use state::{ClientEvent, ClientState, NoticeLevel, Render};
pub use transport::{
    Connector, DuplexHandle, Link, RequestTransport, TransportEvent, WsConnector, spawn_duplex,
};
