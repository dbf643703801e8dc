//! Relay server
//!
//! Binds the secured QUIC endpoint, accepts sessions, and hands each one to
//! a [`crate::session::SessionSupervisor`].

pub mod config;
pub mod endpoint;

pub use config::ServerConfig;
pub use endpoint::RelayServer;
