//! Stream reader
//!
//! One reader task per accepted inbound stream. Each successful read
//! becomes one message, broadcast before the next read starts — that
//! serialization is what guarantees per-sender ordering.

use std::sync::Arc;

use crate::broadcast::{Broadcaster, Message};
use crate::registry::SessionId;
use crate::transport::{InboundStream, RelaySession, TransportError};

/// Read messages from one inbound stream until it ends.
///
/// Bytes are copied out of the scratch buffer into each [`Message`] before
/// the broadcast, so deliveries still in flight can never observe a later
/// read's bytes. Returns `Ok(())` on clean end of stream. The reader never
/// closes the parent session; a failing session surfaces through the
/// supervisor's accept loop.
pub async fn run_reader<S: RelaySession>(
    mut stream: S::Inbound,
    sender: SessionId,
    broadcaster: Arc<Broadcaster<S>>,
    buffer_size: usize,
) -> Result<(), TransportError> {
    let mut buf = vec![0u8; buffer_size];

    loop {
        match stream.read(&mut buf).await {
            Ok(Some(n)) => {
                let message = Message::copied(sender, &buf[..n]);
                broadcaster.broadcast(&message).await;
            }
            Ok(None) => {
                tracing::trace!(session = %sender, "inbound stream finished");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(session = %sender, error = %e, "inbound stream read failed");
                return Err(e);
            }
        }
    }
}
