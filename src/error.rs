//! Crate-level error types
//!
//! Component-local errors (`TransportError`, `RegistryError`, `DeliveryError`,
//! `TlsError`) live next to the code that produces them; this module wraps
//! them for APIs that cross component boundaries, such as running a server or
//! connecting a client.

use crate::registry::RegistryError;
use crate::tls::TlsError;
use crate::transport::TransportError;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug)]
pub enum Error {
    /// I/O failure, e.g. binding the listening endpoint. The only error that
    /// is fatal to the process.
    Io(std::io::Error),
    /// TLS certificate loading or generation failed.
    Tls(TlsError),
    /// Transport-level session failure.
    Transport(TransportError),
    /// Registry invariant violation.
    Registry(RegistryError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Tls(e) => write!(f, "tls error: {}", e),
            Error::Transport(e) => write!(f, "transport error: {}", e),
            Error::Registry(e) => write!(f, "registry error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Tls(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::Registry(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<TlsError> for Error {
    fn from(e: TlsError) -> Self {
        Error::Tls(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}
