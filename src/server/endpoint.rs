//! Relay server endpoint
//!
//! Handles the QUIC accept loop and spawns session supervisors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use quinn::crypto::rustls::QuicServerConfig;
use quinn::VarInt;
use tokio::sync::Semaphore;

use crate::broadcast::Broadcaster;
use crate::error::{Error, Result};
use crate::registry::{SessionId, SessionRegistry};
use crate::session::supervisor::{SessionSupervisor, CLOSE_GOING_AWAY};
use crate::stats::RelayStats;
use crate::tls::{self, TlsError};
use crate::transport::QuicSession;

use super::config::ServerConfig;

/// QUIC broadcast relay server.
pub struct RelayServer {
    config: ServerConfig,
    registry: Arc<SessionRegistry<QuicSession>>,
    broadcaster: Arc<Broadcaster<QuicSession>>,
    stats: Arc<RelayStats>,
    next_session_id: AtomicU64,
    session_semaphore: Option<Arc<Semaphore>>,
}

impl RelayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let stats = Arc::new(RelayStats::new());
        let broadcaster = Arc::new(
            Broadcaster::new(Arc::clone(&registry), Arc::clone(&stats))
                .with_delivery_timeout(config.delivery_timeout),
        );
        let session_semaphore = if config.max_sessions > 0 {
            Some(Arc::new(Semaphore::new(config.max_sessions)))
        } else {
            None
        };

        Self {
            config,
            registry,
            broadcaster,
            stats,
            next_session_id: AtomicU64::new(1),
            session_semaphore,
        }
    }

    /// Get a reference to the session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry<QuicSession>> {
        &self.registry
    }

    /// Get a reference to the server-wide counters.
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Run the server.
    ///
    /// This method blocks until the endpoint is closed. Failure to bind the
    /// endpoint is the only fatal error.
    pub async fn run(&self) -> Result<()> {
        let endpoint = self.bind()?;
        let local_addr = endpoint.local_addr()?;
        tracing::info!(addr = %local_addr, "relay listening");
        self.accept_loop(&endpoint).await
    }

    /// Run the server until `shutdown` resolves, then close the endpoint
    /// and drain.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let endpoint = self.bind()?;
        let local_addr = endpoint.local_addr()?;
        tracing::info!(addr = %local_addr, "relay listening");

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&endpoint) => result,
        };

        endpoint.close(VarInt::from_u32(CLOSE_GOING_AWAY), b"server shutdown");
        endpoint.wait_idle().await;
        result
    }

    async fn accept_loop(&self, endpoint: &quinn::Endpoint) -> Result<()> {
        while let Some(incoming) = endpoint.accept().await {
            match incoming.await {
                Ok(connection) => self.handle_session(connection),
                Err(e) => {
                    tracing::error!(error = %e, "failed to accept session");
                }
            }
        }
        Ok(())
    }

    fn handle_session(&self, connection: quinn::Connection) {
        // Check session limit
        let permit = if let Some(ref sem) = self.session_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(
                        peer = %connection.remote_address(),
                        "session rejected: limit reached"
                    );
                    connection.close(VarInt::from_u32(CLOSE_GOING_AWAY), b"session limit");
                    return;
                }
            }
        } else {
            None
        };

        let id = SessionId::new(self.next_session_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(
            session = %id,
            peer = %connection.remote_address(),
            "new session"
        );

        let supervisor = SessionSupervisor::new(
            id,
            QuicSession::new(connection),
            Arc::clone(&self.registry),
            Arc::clone(&self.broadcaster),
            Arc::clone(&self.stats),
            self.config.read_buffer_size,
        );

        tokio::spawn(async move {
            supervisor.run().await;
            drop(permit);
        });
    }

    fn bind(&self) -> Result<quinn::Endpoint> {
        let crypto = tls::server_crypto(&self.config.certificate)?;
        let quic_crypto = QuicServerConfig::try_from(crypto)
            .map_err(|e| Error::Tls(TlsError::Provider(e.to_string())))?;
        let server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_crypto));
        let endpoint = quinn::Endpoint::server(server_config, self.config.bind_addr)?;
        Ok(endpoint)
    }

    /// Get the configured bind address.
    pub fn bind_addr(&self) -> std::net::SocketAddr {
        self.config.bind_addr
    }
}
