//! Delivery error types

use crate::transport::TransportError;

/// Failure delivering a message to a single recipient.
///
/// Never propagated past the broadcaster: each variant is logged and the
/// recipient skipped, per the relay's best-effort contract.
#[derive(Debug, Clone)]
pub enum DeliveryError {
    /// Opening the outbound stream failed.
    Open(TransportError),
    /// Writing or finishing the payload failed part-way.
    Write(TransportError),
    /// The per-recipient delivery timeout elapsed.
    TimedOut,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Open(e) => write!(f, "failed to open delivery stream: {}", e),
            DeliveryError::Write(e) => write!(f, "failed to write delivery: {}", e),
            DeliveryError::TimedOut => write!(f, "delivery timed out"),
        }
    }
}

impl std::error::Error for DeliveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeliveryError::Open(e) | DeliveryError::Write(e) => Some(e),
            DeliveryError::TimedOut => None,
        }
    }
}
