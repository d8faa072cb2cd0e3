//! Message transports.
//!
//! Two modes share the same user-facing contract (a typed message goes out,
//! a bot reply eventually comes back):
//!
//! - **Duplex** ([`spawn_duplex`]): a supervisor task owns one long-lived
//!   [`Link`], buffers frames in a [`DeliveryQueue`](crate::queue::DeliveryQueue)
//!   while the link is down, and reconnects on a [`ReconnectPolicy`](parley_core::ReconnectPolicy).
//! - **Request** ([`RequestTransport`]): one HTTP call per message with a
//!   per-request timeout.

mod duplex;
mod link;
mod request;
mod ws;

pub use duplex::{DuplexHandle, spawn_duplex};
pub use link::{Connector, Link};
pub use request::RequestTransport;
pub use ws::WsConnector;

use parley_core::{ConnectionState, ServerFrame};

use crate::queue::FlushReport;

/// Notifications emitted by the duplex supervisor.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    /// Connection state changed.
    State(ConnectionState),
    /// A decoded inbound frame.
    Frame(ServerFrame),
    /// A frame was buffered because the link is down.
    Queued {
        /// Frames now waiting.
        pending: usize,
    },
    /// The delivery queue was drained (fully or up to a failure) after
    /// connecting.
    Flushed(FlushReport),
    /// The reconnect policy ran out of attempts; the supervisor idles until
    /// [`DuplexHandle::reconnect_now`].
    GaveUp {
        /// Consecutive failed attempts.
        attempts: u32,
    },
}
