//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::tls::CertSource;

/// Default size of each stream reader's scratch buffer, which also bounds
/// the size of a single relayed message.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Server configuration options.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the QUIC endpoint to.
    pub bind_addr: SocketAddr,

    /// Maximum concurrent sessions (0 = unlimited).
    pub max_sessions: usize,

    /// Stream reader scratch buffer size; one read is one relayed message.
    pub read_buffer_size: usize,

    /// Bound on one recipient's open + write + finish during fan-out.
    /// `None` disables the bound.
    pub delivery_timeout: Option<Duration>,

    /// Certificate material for the listening endpoint.
    pub certificate: CertSource,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:4433".parse().unwrap(),
            max_sessions: 0, // Unlimited
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            delivery_timeout: Some(Duration::from_secs(5)),
            certificate: CertSource::SelfSigned,
        }
    }
}

impl ServerConfig {
    /// Create a new config with a custom bind address.
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address.
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the maximum number of concurrent sessions.
    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Set the read buffer (and so maximum message) size. Clamped to at
    /// least one byte.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Set the per-recipient delivery timeout.
    pub fn delivery_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Serve the given PEM certificate chain and key instead of a
    /// self-signed identity.
    pub fn certificate_files(mut self, cert: PathBuf, key: PathBuf) -> Self {
        self.certificate = CertSource::Files { cert, key };
        self
    }
}
