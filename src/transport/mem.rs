//! In-memory transport
//!
//! A pair of linked session halves connected by channels, mirroring the QUIC
//! transport's semantics: streams opened on one half are accepted by the
//! other, closing either half wakes every blocked accept and read on both,
//! and finished streams end cleanly. Used by the crate's lifecycle and
//! broadcast tests; also handy for wiring a relay core together without a
//! network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

use super::{InboundStream, OutboundStream, RelaySession, TransportError};

/// Create a linked pair of in-memory sessions.
///
/// Streams opened on one half arrive at the other half's accept queue.
/// Closing either half closes the session for both, like a QUIC connection.
pub fn session_pair() -> (MemSession, MemSession) {
    let (closed_tx, closed_rx) = watch::channel(false);
    let shared = Arc::new(Shared {
        closed_tx,
        close_reason: Mutex::new(None),
    });

    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();

    let a = MemSession {
        inner: Arc::new(Half {
            accept_rx: tokio::sync::Mutex::new(a_rx),
            peer_tx: b_tx,
            closed_rx: closed_rx.clone(),
            shared: Arc::clone(&shared),
            fail_opens: AtomicBool::new(false),
        }),
    };
    let b = MemSession {
        inner: Arc::new(Half {
            accept_rx: tokio::sync::Mutex::new(b_rx),
            peer_tx: a_tx,
            closed_rx,
            shared,
            fail_opens: AtomicBool::new(false),
        }),
    };
    (a, b)
}

/// State shared by both halves of a pair.
struct Shared {
    closed_tx: watch::Sender<bool>,
    close_reason: Mutex<Option<(u32, String)>>,
}

struct Half {
    accept_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<MemInbound>>,
    peer_tx: mpsc::UnboundedSender<MemInbound>,
    closed_rx: watch::Receiver<bool>,
    shared: Arc<Shared>,
    fail_opens: AtomicBool,
}

/// One half of an in-memory session pair.
#[derive(Clone)]
pub struct MemSession {
    inner: Arc<Half>,
}

impl MemSession {
    /// Make subsequent `open_stream` calls on this half fail.
    ///
    /// Lets tests exercise per-recipient delivery failures without tearing
    /// the session down.
    pub fn set_open_fault(&self, enabled: bool) {
        self.inner.fail_opens.store(enabled, Ordering::Relaxed);
    }

    /// The code and reason the session was closed with, if it was.
    pub fn close_reason(&self) -> Option<(u32, String)> {
        self.inner
            .shared
            .close_reason
            .lock()
            .expect("close_reason lock poisoned")
            .clone()
    }

    fn is_closed(&self) -> bool {
        *self.inner.closed_rx.borrow()
    }
}

impl RelaySession for MemSession {
    type Inbound = MemInbound;
    type Outbound = MemOutbound;

    async fn accept_stream(&self) -> Result<MemInbound, TransportError> {
        if self.is_closed() {
            return Err(TransportError::SessionClosed("session closed".into()));
        }
        let mut accept_rx = self.inner.accept_rx.lock().await;
        let mut closed_rx = self.inner.closed_rx.clone();
        tokio::select! {
            stream = accept_rx.recv() => match stream {
                Some(stream) => Ok(stream),
                None => Err(TransportError::SessionClosed("peer endpoint dropped".into())),
            },
            _ = closed_rx.changed() => {
                Err(TransportError::SessionClosed("session closed".into()))
            }
        }
    }

    async fn open_stream(&self) -> Result<MemOutbound, TransportError> {
        if self.inner.fail_opens.load(Ordering::Relaxed) {
            return Err(TransportError::Stream("open refused".into()));
        }
        if self.is_closed() {
            return Err(TransportError::SessionClosed("session closed".into()));
        }
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let inbound = MemInbound {
            chunks: chunk_rx,
            pending: None,
            closed_rx: self.inner.closed_rx.clone(),
        };
        self.inner
            .peer_tx
            .send(inbound)
            .map_err(|_| TransportError::SessionClosed("peer endpoint dropped".into()))?;
        Ok(MemOutbound {
            chunks: Some(chunk_tx),
        })
    }

    fn close(&self, code: u32, reason: &str) {
        let mut close_reason = self
            .inner
            .shared
            .close_reason
            .lock()
            .expect("close_reason lock poisoned");
        if close_reason.is_none() {
            *close_reason = Some((code, reason.to_string()));
        }
        drop(close_reason);
        let _ = self.inner.shared.closed_tx.send(true);
    }

    fn remote_addr(&self) -> Option<std::net::SocketAddr> {
        None
    }
}

/// Read half of an in-memory stream.
pub struct MemInbound {
    chunks: mpsc::UnboundedReceiver<Bytes>,
    pending: Option<Bytes>,
    closed_rx: watch::Receiver<bool>,
}

impl InboundStream for MemInbound {
    async fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        if *self.closed_rx.borrow() {
            return Err(TransportError::SessionClosed("session closed".into()));
        }
        let chunk = match self.pending.take() {
            Some(chunk) => chunk,
            None => {
                let mut closed_rx = self.closed_rx.clone();
                tokio::select! {
                    chunk = self.chunks.recv() => match chunk {
                        Some(chunk) => chunk,
                        // Writer finished the stream.
                        None => return Ok(None),
                    },
                    _ = closed_rx.changed() => {
                        return Err(TransportError::SessionClosed("session closed".into()));
                    }
                }
            }
        };

        let n = buf.len().min(chunk.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.pending = Some(chunk.slice(n..));
        }
        Ok(Some(n))
    }
}

/// Write half of an in-memory stream.
pub struct MemOutbound {
    chunks: Option<mpsc::UnboundedSender<Bytes>>,
}

impl OutboundStream for MemOutbound {
    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let chunks = self
            .chunks
            .as_ref()
            .ok_or_else(|| TransportError::Stream("stream already finished".into()))?;
        chunks
            .send(Bytes::copy_from_slice(data))
            .map_err(|_| TransportError::Stream("stream stopped by peer".into()))
    }

    fn finish(&mut self) -> Result<(), TransportError> {
        match self.chunks.take() {
            Some(_) => Ok(()),
            None => Err(TransportError::Stream("stream already finished".into())),
        }
    }
}
