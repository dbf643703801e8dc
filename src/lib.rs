//! # relay-rs
//!
//! A QUIC broadcast relay: clients hold long-lived multiplexed sessions with
//! the server, and every message a client sends is fanned out to all other
//! connected clients.
//!
//! The crate is split into a transport-agnostic core (session registry,
//! stream readers, broadcaster, per-session supervisors) and the QUIC glue
//! that feeds it:
//!
//! - [`registry`] — the authoritative set of sessions eligible for broadcast
//! - [`broadcast`] — message type and fan-out engine
//! - [`session`] — per-session lifecycle (supervisor + stream readers)
//! - [`transport`] — session/stream traits, the `quinn` implementation, and
//!   an in-memory transport for tests
//! - [`server`] — endpoint setup and accept loop
//! - [`client`] — a small client for talking to a relay
//! - [`tls`] — certificate material for the listening endpoint
//!
//! ## Server example
//!
//! ```no_run
//! use relay_rs::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> relay_rs::error::Result<()> {
//!     let config = ServerConfig::default();
//!     let server = RelayServer::new(config);
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod error;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;
pub mod tls;
pub mod transport;

pub use broadcast::{Broadcaster, Message};
pub use client::{ClientConfig, RelayClient};
pub use error::{Error, Result};
pub use registry::{SessionId, SessionRegistry};
pub use server::{RelayServer, ServerConfig};
