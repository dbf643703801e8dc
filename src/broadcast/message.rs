//! Broadcast message type

use bytes::Bytes;

use crate::registry::SessionId;

/// One relayed payload.
///
/// A message is a value: its bytes are copied out of the reader's scratch
/// buffer at construction, so in-flight deliveries can never alias a buffer
/// that a subsequent read will overwrite. Cloning is cheap via `Bytes`
/// reference counting.
#[derive(Debug, Clone)]
pub struct Message {
    /// Session the message was read from. Excluded from delivery.
    pub sender: SessionId,
    /// Immutable payload bytes.
    pub payload: Bytes,
}

impl Message {
    /// Wrap an already-immutable payload.
    pub fn new(sender: SessionId, payload: Bytes) -> Self {
        Self { sender, payload }
    }

    /// Build a message by copying bytes out of a scratch buffer.
    pub fn copied(sender: SessionId, bytes: &[u8]) -> Self {
        Self {
            sender,
            payload: Bytes::copy_from_slice(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
