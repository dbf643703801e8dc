//! Message type and broadcast fan-out engine
//!
//! A [`Message`] is one payload read from a sender's stream. The
//! [`Broadcaster`] delivers it to every other registered session over a
//! fresh outbound stream, best-effort per recipient: one recipient failing
//! never aborts delivery to the rest.
//!
//! Delivery is synchronous within the calling reader's task — the reader
//! does not resume until every recipient has been attempted. That bounds
//! memory (no outbound queue) and is what gives per-sender ordering.

pub mod error;
pub mod fanout;
pub mod message;

pub use error::DeliveryError;
pub use fanout::{BroadcastOutcome, Broadcaster};
pub use message::Message;
