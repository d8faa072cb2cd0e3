//! Connection abstraction under the duplex supervisor.
//!
//! A [`Connector`] dials the backend and yields a [`Link`] carrying JSON text
//! frames. The WebSocket implementation lives in [`super::ws`]; tests plug in
//! in-memory links.

use async_trait::async_trait;
use parley_core::TransportError;

/// One established duplex connection.
#[async_trait]
pub trait Link: Send {
    /// Transmit one text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Next inbound text frame; `None` once the peer closed the connection.
    ///
    /// Must be cancel-safe: the supervisor races it against outbound
    /// commands.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the connection politely.
    async fn close(&mut self);
}

/// Dials new [`Link`]s.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection.
    async fn connect(&self) -> Result<Box<dyn Link>, TransportError>;
}
