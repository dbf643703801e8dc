//! Transport abstraction consumed by the relay core
//!
//! The core (registry, readers, broadcaster, supervisors) never touches a
//! concrete transport. It consumes sessions through the [`RelaySession`]
//! trait: accept inbound streams, open outbound streams, close with a reason
//! code. [`quic`] provides the production implementation over `quinn`;
//! [`mem`] provides an in-memory implementation used by tests.

use std::future::Future;
use std::net::SocketAddr;

pub mod mem;
pub mod quic;

pub use mem::{session_pair, MemSession};
pub use quic::QuicSession;

/// A live, multiplexed client session.
///
/// Handles are cheap to clone; all clones refer to the same underlying
/// session, so the registry can hold one while supervisors and broadcasters
/// hold others.
pub trait RelaySession: Clone + Send + Sync + 'static {
    /// Stream accepted from the peer; carries one or more inbound messages.
    type Inbound: InboundStream;
    /// Stream opened towards the peer; carries one outbound delivery.
    type Outbound: OutboundStream;

    /// Wait for the peer to open the next inbound stream.
    ///
    /// Blocks until a stream arrives or the session dies. An error here is
    /// fatal for the whole session, not just one stream.
    fn accept_stream(
        &self,
    ) -> impl Future<Output = Result<Self::Inbound, TransportError>> + Send;

    /// Open a fresh outbound stream towards the peer.
    fn open_stream(
        &self,
    ) -> impl Future<Output = Result<Self::Outbound, TransportError>> + Send;

    /// Close the session with an application reason code.
    ///
    /// Must unblock pending [`accept_stream`](Self::accept_stream) calls and
    /// make outstanding reads on this session's streams observe an error.
    fn close(&self, code: u32, reason: &str);

    /// Remote peer address, when the transport knows one.
    fn remote_addr(&self) -> Option<SocketAddr>;
}

/// Read half of an inbound stream.
pub trait InboundStream: Send + 'static {
    /// Read up to `buf.len()` bytes.
    ///
    /// `Ok(Some(n))` delivers `n` bytes in `buf[..n]`; `Ok(None)` is the
    /// clean end of the stream; `Err` is a transport failure (including the
    /// parent session closing).
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<Option<usize>, TransportError>> + Send;
}

/// Write half of an outbound stream.
pub trait OutboundStream: Send + 'static {
    /// Write the whole payload.
    fn write_all(
        &mut self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Finish the stream, signalling the clean end of the delivery to the
    /// peer.
    fn finish(&mut self) -> Result<(), TransportError>;
}

/// Transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The session terminated, locally or by the peer. Covers clean
    /// shutdown and connection loss alike.
    SessionClosed(String),
    /// A single stream failed (reset, stopped, or refused) while the session
    /// itself may still be alive.
    Stream(String),
}

impl TransportError {
    /// Whether the whole session is gone, as opposed to one stream.
    pub fn is_session_closed(&self) -> bool {
        matches!(self, TransportError::SessionClosed(_))
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::SessionClosed(reason) => write!(f, "session closed: {}", reason),
            TransportError::Stream(reason) => write!(f, "stream error: {}", reason),
        }
    }
}

impl std::error::Error for TransportError {}
