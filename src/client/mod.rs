//! Relay client
//!
//! A small client for talking to a relay server: connect, send messages,
//! and receive the broadcasts of other clients.

pub mod config;
pub mod connector;

pub use config::ClientConfig;
pub use connector::RelayClient;
