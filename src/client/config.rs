//! Client configuration

use std::net::SocketAddr;
use std::path::PathBuf;

/// Cap on the size of one incoming broadcast, in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Client configuration options.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the relay server.
    pub server_addr: SocketAddr,

    /// Server name the certificate must match.
    pub server_name: String,

    /// PEM certificate to trust. For self-signed deployments this is the
    /// file written by [`crate::tls::write_self_signed`].
    pub root_cert: PathBuf,

    /// Incoming broadcasts larger than this are dropped.
    pub max_message_size: usize,
}

impl ClientConfig {
    /// Create a config for the given relay address, trusting `root_cert`.
    pub fn new(server_addr: SocketAddr, root_cert: PathBuf) -> Self {
        Self {
            server_addr,
            server_name: "localhost".to_string(),
            root_cert,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Set the server name to verify the certificate against.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Set the incoming message size cap.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }
}
