//! QUIC transport backed by `quinn`
//!
//! A QUIC connection is a relay session. Inbound messages arrive on
//! unidirectional streams the peer opens; deliveries go out on fresh
//! unidirectional streams, finished after one payload.

use std::net::SocketAddr;

use quinn::VarInt;

use super::{InboundStream, OutboundStream, RelaySession, TransportError};

/// Relay session over a QUIC connection.
#[derive(Clone)]
pub struct QuicSession {
    connection: quinn::Connection,
}

impl QuicSession {
    pub fn new(connection: quinn::Connection) -> Self {
        Self { connection }
    }

    /// Access the underlying connection.
    pub fn connection(&self) -> &quinn::Connection {
        &self.connection
    }
}

impl RelaySession for QuicSession {
    type Inbound = QuicInbound;
    type Outbound = QuicOutbound;

    async fn accept_stream(&self) -> Result<QuicInbound, TransportError> {
        let recv = self.connection.accept_uni().await?;
        Ok(QuicInbound { recv })
    }

    async fn open_stream(&self) -> Result<QuicOutbound, TransportError> {
        let send = self.connection.open_uni().await?;
        Ok(QuicOutbound { send })
    }

    fn close(&self, code: u32, reason: &str) {
        self.connection
            .close(VarInt::from_u32(code), reason.as_bytes());
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        Some(self.connection.remote_address())
    }
}

/// Read half of an inbound unidirectional stream.
pub struct QuicInbound {
    recv: quinn::RecvStream,
}

impl InboundStream for QuicInbound {
    async fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        Ok(self.recv.read(buf).await?)
    }
}

/// Write half of an outbound unidirectional stream.
pub struct QuicOutbound {
    send: quinn::SendStream,
}

impl OutboundStream for QuicOutbound {
    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        Ok(self.send.write_all(data).await?)
    }

    fn finish(&mut self) -> Result<(), TransportError> {
        Ok(self.send.finish()?)
    }
}

impl From<quinn::ConnectionError> for TransportError {
    fn from(e: quinn::ConnectionError) -> Self {
        TransportError::SessionClosed(e.to_string())
    }
}

impl From<quinn::ReadError> for TransportError {
    fn from(e: quinn::ReadError) -> Self {
        match e {
            quinn::ReadError::ConnectionLost(e) => TransportError::SessionClosed(e.to_string()),
            other => TransportError::Stream(other.to_string()),
        }
    }
}

impl From<quinn::WriteError> for TransportError {
    fn from(e: quinn::WriteError) -> Self {
        match e {
            quinn::WriteError::ConnectionLost(e) => TransportError::SessionClosed(e.to_string()),
            other => TransportError::Stream(other.to_string()),
        }
    }
}

impl From<quinn::ClosedStream> for TransportError {
    fn from(e: quinn::ClosedStream) -> Self {
        TransportError::Stream(e.to_string())
    }
}
