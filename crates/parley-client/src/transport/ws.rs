//! WebSocket [`Connector`] over `tokio-tungstenite`.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parley_core::TransportError;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use super::link::{Connector, Link};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials `ws_url?token=<jwt>`.
pub struct WsConnector {
    url: Url,
    connect_timeout: Duration,
}

impl WsConnector {
    /// Connector for `ws_url`, authenticating with `token` when present.
    pub fn new(
        ws_url: &str,
        token: Option<&str>,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut url = Url::parse(ws_url)
            .map_err(|e| TransportError::Connect(format!("invalid WebSocket URL {ws_url}: {e}")))?;
        if let Some(token) = token {
            let _ = url.query_pairs_mut().append_pair("token", token);
        }
        Ok(Self {
            url,
            connect_timeout,
        })
    }

    /// The URL that will be dialed, token included.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn Link>, TransportError> {
        debug!(
            host = self.url.host_str().unwrap_or(""),
            path = self.url.path(),
            "dialing websocket"
        );
        let timeout_ms = u64::try_from(self.connect_timeout.as_millis()).unwrap_or(u64::MAX);
        let dial = connect_async(self.url.as_str());
        let (ws, _response) = tokio::time::timeout(self.connect_timeout, dial)
            .await
            .map_err(|_| TransportError::Timeout { timeout_ms })?
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Box::new(WsLink { ws }))
    }
}

struct WsLink {
    ws: WsStream,
}

#[async_trait]
impl Link for WsLink {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.ws.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "websocket close frame received");
                    return None;
                }
                // Pings are answered by tungstenite on the next read or write
                Ok(_) => {}
                Err(e) => return Some(Err(TransportError::Connect(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
