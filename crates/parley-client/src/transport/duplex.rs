//! Duplex supervisor.
//!
//! One task owns the [`Link`], the [`DeliveryQueue`] and the reconnect
//! counter. Callers talk to it through [`DuplexHandle`] (an mpsc command
//! channel) and observe it through [`TransportEvent`]s and a `watch` of the
//! connection state.
//!
//! Lifecycle: `Connecting` → `Open` (flush queue, then serve) → `Closed` →
//! `Reconnecting` (wait the policy delay, buffering sends) → `Connecting`.

use std::sync::Arc;

use parley_core::{ClientFrame, ConnectionState, ReconnectPolicy, ServerFrame, TransportError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::TransportEvent;
use super::link::{Connector, Link};
use crate::queue::DeliveryQueue;

enum Command {
    Send(ClientFrame),
    Reconnect,
}

/// Handle to a running duplex supervisor. Dropping it shuts the supervisor
/// down.
pub struct DuplexHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    state_rx: watch::Receiver<ConnectionState>,
    task: Option<JoinHandle<()>>,
}

impl DuplexHandle {
    /// Send a frame now if the link is open, otherwise queue it.
    pub fn send(&self, frame: ClientFrame) -> Result<(), TransportError> {
        self.cmd_tx
            .send(Command::Send(frame))
            .map_err(|_| TransportError::Shutdown)
    }

    /// Skip the current reconnect delay, or resume after the supervisor gave
    /// up. Ignored while connected.
    pub fn reconnect_now(&self) -> Result<(), TransportError> {
        self.cmd_tx
            .send(Command::Reconnect)
            .map_err(|_| TransportError::Shutdown)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Ask the supervisor to close the link and exit.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Shut down and wait for the supervisor task to finish.
    pub async fn join(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for DuplexHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start a supervisor that connects through `connector` immediately.
pub fn spawn_duplex(
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
) -> (DuplexHandle, mpsc::UnboundedReceiver<TransportEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Closed);
    let cancel = CancellationToken::new();

    let supervisor = Supervisor {
        connector,
        policy,
        queue: DeliveryQueue::new(),
        cmd_rx,
        events: events_tx,
        state_tx,
        cancel: cancel.clone(),
        failures: 0,
    };
    let task = tokio::spawn(supervisor.run());

    let handle = DuplexHandle {
        cmd_tx,
        cancel,
        state_rx,
        task: Some(task),
    };
    (handle, events_rx)
}

#[derive(Debug, PartialEq, Eq)]
enum LinkEnd {
    Dropped,
    Shutdown,
}

struct Supervisor {
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    queue: DeliveryQueue,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<TransportEvent>,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    failures: u32,
}

impl Supervisor {
    async fn run(mut self) {
        loop {
            let Some(connected) = self.connect().await else {
                break;
            };
            match connected {
                Ok(mut link) => {
                    self.failures = 0;
                    self.set_state(ConnectionState::Open);
                    info!("duplex link open");
                    let end = self.serve(link.as_mut()).await;
                    link.close().await;
                    if end == LinkEnd::Shutdown {
                        break;
                    }
                    info!(pending = self.queue.len(), "duplex link lost");
                }
                Err(e) => warn!(error = %e, failures = self.failures, "connect failed"),
            }
            self.set_state(ConnectionState::Closed);
            if !self.wait_before_retry().await {
                break;
            }
        }
        self.set_state(ConnectionState::Closed);
        if !self.queue.is_empty() {
            warn!(pending = self.queue.len(), "duplex supervisor stopped with undelivered frames");
        }
        debug!("duplex supervisor exited");
    }

    /// Dial once, buffering sends while the attempt is in flight. `None` on
    /// shutdown.
    async fn connect(&mut self) -> Option<Result<Box<dyn Link>, TransportError>> {
        self.set_state(ConnectionState::Connecting);
        let connector = Arc::clone(&self.connector);
        let attempt = connector.connect();
        tokio::pin!(attempt);
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return None,
                result = &mut attempt => return Some(result),
                cmd = self.cmd_rx.recv() => {
                    let Some(cmd) = cmd else { return None };
                    let _ = self.buffer(cmd);
                }
            }
        }
    }

    async fn serve(&mut self, link: &mut dyn Link) -> LinkEnd {
        let report = self.queue.flush(link).await;
        let flushed = report.error.is_none();
        if report.sent > 0 || !flushed {
            info!(sent = report.sent, remaining = report.remaining, "delivery queue flushed");
            self.emit(TransportEvent::Flushed(report));
        }
        if !flushed {
            return LinkEnd::Dropped;
        }

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return LinkEnd::Shutdown,
                cmd = self.cmd_rx.recv() => match cmd {
                    None => return LinkEnd::Shutdown,
                    Some(Command::Reconnect) => debug!("reconnect requested while open; ignored"),
                    Some(Command::Send(frame)) => {
                        if self.deliver(link, frame).await.is_err() {
                            return LinkEnd::Dropped;
                        }
                    }
                },
                incoming = link.recv() => match incoming {
                    None => {
                        debug!("peer closed the link");
                        return LinkEnd::Dropped;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "duplex read failed");
                        return LinkEnd::Dropped;
                    }
                    Some(Ok(text)) => self.dispatch(&text),
                },
            }
        }
    }

    /// Send one frame on an open link. A failed send puts the frame back in
    /// the queue so it goes out after reconnecting.
    async fn deliver(
        &mut self,
        link: &mut dyn Link,
        frame: ClientFrame,
    ) -> Result<(), TransportError> {
        let text = match frame.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "dropping unserializable frame");
                return Ok(());
            }
        };
        if let Err(e) = link.send(text).await {
            warn!(error = %e, "send failed; frame queued for redelivery");
            let pending = self.queue.push(frame);
            self.emit(TransportEvent::Queued { pending });
            return Err(e);
        }
        Ok(())
    }

    fn dispatch(&mut self, text: &str) {
        match ServerFrame::parse(text) {
            Ok(ServerFrame::Unknown) => debug!("ignoring unknown frame type"),
            Ok(frame) => self.emit(TransportEvent::Frame(frame)),
            Err(e) => warn!(error = %e, "undecodable inbound frame"),
        }
    }

    /// Apply a command received while the link is down. Returns whether a
    /// reconnect was requested.
    fn buffer(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Send(frame) => {
                let pending = self.queue.push(frame);
                debug!(pending, "link down; frame queued");
                self.emit(TransportEvent::Queued { pending });
                false
            }
            Command::Reconnect => true,
        }
    }

    /// Sleep for the policy delay, or idle if attempts are exhausted.
    /// Returns `false` on shutdown.
    async fn wait_before_retry(&mut self) -> bool {
        let Some(delay) = self.policy.delay_with_random(self.failures, rand::random()) else {
            warn!(attempts = self.failures, "reconnect attempts exhausted");
            self.emit(TransportEvent::GaveUp {
                attempts: self.failures,
            });
            return self.idle_until_reconnect().await;
        };
        self.failures = self.failures.saturating_add(1);
        self.set_state(ConnectionState::Reconnecting);
        info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt = self.failures,
            "reconnecting"
        );

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return false,
                () = &mut sleep => return true,
                cmd = self.cmd_rx.recv() => {
                    let Some(cmd) = cmd else { return false };
                    if self.buffer(cmd) {
                        return true;
                    }
                }
            }
        }
    }

    async fn idle_until_reconnect(&mut self) -> bool {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return false,
                cmd = self.cmd_rx.recv() => {
                    let Some(cmd) = cmd else { return false };
                    if self.buffer(cmd) {
                        self.failures = 0;
                        return true;
                    }
                }
            }
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if *self.state_tx.borrow() == state {
            return;
        }
        let _ = self.state_tx.send_replace(state);
        self.emit(TransportEvent::State(state));
    }

    fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
