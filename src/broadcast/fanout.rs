//! Broadcast fan-out implementation

use std::sync::Arc;
use std::time::Duration;

use crate::registry::SessionRegistry;
use crate::stats::RelayStats;
use crate::transport::{OutboundStream, RelaySession};

use super::error::DeliveryError;
use super::message::Message;

/// Default bound on one recipient's open + write + finish.
///
/// Keeps a stalled recipient from holding up delivery to recipients later
/// in the snapshot indefinitely.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Fans a message out to every registered session except its sender.
pub struct Broadcaster<S> {
    registry: Arc<SessionRegistry<S>>,
    stats: Arc<RelayStats>,
    delivery_timeout: Option<Duration>,
}

impl<S: RelaySession> Broadcaster<S> {
    pub fn new(registry: Arc<SessionRegistry<S>>, stats: Arc<RelayStats>) -> Self {
        Self {
            registry,
            stats,
            delivery_timeout: Some(DEFAULT_DELIVERY_TIMEOUT),
        }
    }

    /// Override the per-recipient delivery timeout. `None` disables it.
    pub fn with_delivery_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Deliver `message` to every registered session other than its sender.
    ///
    /// Each recipient gets a fresh outbound stream carrying the full payload,
    /// then the stream is finished. Failures are logged and skip that
    /// recipient only. Returns once every recipient has been attempted —
    /// fire-and-forget, no acknowledgment is awaited.
    pub async fn broadcast(&self, message: &Message) -> BroadcastOutcome {
        self.stats.record_message(message.len());

        let recipients = self.registry.snapshot(Some(message.sender)).await;
        let mut outcome = BroadcastOutcome::default();

        for (id, session) in recipients {
            outcome.attempted += 1;
            match self.deliver(&session, message).await {
                Ok(()) => {
                    outcome.delivered += 1;
                    self.stats.record_delivery(true);
                }
                Err(e) => {
                    outcome.failed += 1;
                    self.stats.record_delivery(false);
                    tracing::warn!(
                        recipient = %id,
                        sender = %message.sender,
                        error = %e,
                        "delivery failed, skipping recipient"
                    );
                }
            }
        }

        tracing::trace!(
            sender = %message.sender,
            bytes = message.len(),
            attempted = outcome.attempted,
            delivered = outcome.delivered,
            "broadcast complete"
        );
        outcome
    }

    async fn deliver(&self, session: &S, message: &Message) -> Result<(), DeliveryError> {
        let attempt = async {
            let mut stream = session.open_stream().await.map_err(DeliveryError::Open)?;
            stream
                .write_all(&message.payload)
                .await
                .map_err(DeliveryError::Write)?;
            stream.finish().map_err(DeliveryError::Write)?;
            Ok(())
        };

        match self.delivery_timeout {
            Some(timeout) => tokio::time::timeout(timeout, attempt)
                .await
                .map_err(|_| DeliveryError::TimedOut)?,
            None => attempt.await,
        }
    }
}

/// Result of one fan-out pass. Counts only; the relay never reports
/// delivery status back to the sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Recipients in the snapshot (sender excluded).
    pub attempted: usize,
    /// Recipients whose stream was opened, written, and finished.
    pub delivered: usize,
    /// Recipients skipped after an open/write/timeout failure.
    pub failed: usize,
}
