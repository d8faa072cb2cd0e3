//! In-memory FIFO of frames submitted while the duplex link is down.
//!
//! Owned by the duplex supervisor. A frame leaves the queue only after the
//! link accepted it; a failed send leaves it (and everything behind it) in
//! place for the next flush.

use std::collections::VecDeque;

use parley_core::{ClientFrame, TransportError};
use tracing::{debug, warn};

use crate::transport::Link;

/// Outcome of one [`DeliveryQueue::flush`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Frames transmitted.
    pub sent: usize,
    /// Frames still queued.
    pub remaining: usize,
    /// The failure that stopped the flush.
    pub error: Option<TransportError>,
}

impl FlushReport {
    /// Whether every queued frame was transmitted.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.remaining == 0
    }
}

/// Pending outbound frames, oldest first.
#[derive(Debug, Default)]
pub struct DeliveryQueue {
    frames: VecDeque<ClientFrame>,
}

impl DeliveryQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame; returns the new queue length.
    pub fn push(&mut self, frame: ClientFrame) -> usize {
        self.frames.push_back(frame);
        self.frames.len()
    }

    /// Number of queued frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Queued frames in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = &ClientFrame> {
        self.frames.iter()
    }

    /// Drain the queue into `link` in submission order, stopping at the first
    /// failed send.
    pub async fn flush(&mut self, link: &mut dyn Link) -> FlushReport {
        let mut sent = 0;
        while let Some(frame) = self.frames.front() {
            let text = match frame.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "dropping unserializable queued frame");
                    let _ = self.frames.pop_front();
                    continue;
                }
            };
            if let Err(error) = link.send(text).await {
                return FlushReport {
                    sent,
                    remaining: self.frames.len(),
                    error: Some(error),
                };
            }
            let _ = self.frames.pop_front();
            sent += 1;
        }
        debug!(sent, "delivery queue drained");
        FlushReport {
            sent,
            remaining: 0,
            error: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingLink;

    fn msg(text: &str) -> ClientFrame {
        ClientFrame::user_message(text, Some(parley_core::SessionId::from_int(1)))
    }

    fn texts(link: &RecordingLink) -> Vec<String> {
        link.sent
            .iter()
            .map(|raw| {
                let v: serde_json::Value = serde_json::from_str(raw).unwrap();
                v["message"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn flush_preserves_submission_order() {
        let mut queue = DeliveryQueue::new();
        for t in ["one", "two", "three"] {
            let _ = queue.push(msg(t));
        }
        let mut link = RecordingLink::default();
        let report = queue.flush(&mut link).await;

        assert!(report.is_complete());
        assert_eq!(report.sent, 3);
        assert_eq!(texts(&link), ["one", "two", "three"]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn flush_stops_at_first_failure() {
        let mut queue = DeliveryQueue::new();
        for t in ["a", "b", "c", "d"] {
            let _ = queue.push(msg(t));
        }
        let mut link = RecordingLink::failing_at(2);
        let report = queue.flush(&mut link).await;

        assert_eq!(report.sent, 2);
        assert_eq!(report.remaining, 2);
        assert_eq!(report.error, Some(TransportError::Closed));
        assert_eq!(texts(&link), ["a", "b"]);

        let left: Vec<_> = queue.iter().cloned().collect();
        assert_eq!(left, vec![msg("c"), msg("d")]);
    }

    #[tokio::test]
    async fn flush_of_empty_queue_is_complete() {
        let mut queue = DeliveryQueue::new();
        let report = queue.flush(&mut RecordingLink::default()).await;
        assert_eq!(report, FlushReport::default());
    }

    #[test]
    fn push_reports_length() {
        let mut queue = DeliveryQueue::new();
        assert_eq!(queue.push(msg("x")), 1);
        assert_eq!(queue.push(msg("y")), 2);
        assert_eq!(queue.len(), 2);
    }
}
