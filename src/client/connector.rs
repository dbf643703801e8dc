//! Relay client connection
//!
//! Connects a QUIC endpoint to a relay server, sends messages on fresh
//! unidirectional streams, and surfaces incoming broadcasts through a
//! channel.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use quinn::crypto::rustls::QuicClientConfig;
use quinn::VarInt;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::tls::{self, TlsError};
use crate::transport::TransportError;

use super::config::ClientConfig;

/// Connected relay client.
///
/// # Example
/// ```no_run
/// use relay_rs::client::{ClientConfig, RelayClient};
///
/// # async fn example() -> relay_rs::error::Result<()> {
/// let config = ClientConfig::new("127.0.0.1:4433".parse().unwrap(), "cert.pem".into());
/// let (client, mut incoming) = RelayClient::connect(config).await?;
///
/// tokio::spawn(async move {
///     while let Some(message) = incoming.recv().await {
///         println!("<- {:?}", message);
///     }
/// });
///
/// client.send(b"hello everyone").await?;
/// # Ok(())
/// # }
/// ```
pub struct RelayClient {
    endpoint: quinn::Endpoint,
    connection: quinn::Connection,
}

impl RelayClient {
    /// Connect to a relay server.
    ///
    /// Returns the client and a receiver yielding every broadcast the relay
    /// delivers to this session, in arrival order.
    pub async fn connect(config: ClientConfig) -> Result<(Self, mpsc::Receiver<Bytes>)> {
        let crypto = tls::client_crypto(&config.root_cert)?;
        let quic_crypto = QuicClientConfig::try_from(crypto)
            .map_err(|e| Error::Tls(TlsError::Provider(e.to_string())))?;
        let client_config = quinn::ClientConfig::new(Arc::new(quic_crypto));

        let mut endpoint =
            quinn::Endpoint::client(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))?;
        endpoint.set_default_client_config(client_config);

        let connection = endpoint
            .connect(config.server_addr, &config.server_name)
            .map_err(|e| Error::Transport(TransportError::SessionClosed(e.to_string())))?
            .await
            .map_err(TransportError::from)?;

        tracing::debug!(addr = %config.server_addr, "connected to relay");

        let (incoming_tx, incoming_rx) = mpsc::channel(256);
        tokio::spawn(receive_loop(
            connection.clone(),
            incoming_tx,
            config.max_message_size,
        ));

        Ok((
            Self {
                endpoint,
                connection,
            },
            incoming_rx,
        ))
    }

    /// Send one message to the relay for fan-out to every other client.
    pub async fn send(&self, payload: &[u8]) -> Result<()> {
        let mut stream = self
            .connection
            .open_uni()
            .await
            .map_err(TransportError::from)?;
        stream.write_all(payload).await.map_err(TransportError::from)?;
        stream.finish().map_err(TransportError::from)?;
        Ok(())
    }

    /// Whether the session is still alive.
    pub fn is_connected(&self) -> bool {
        self.connection.close_reason().is_none()
    }

    /// Close the session and wait for the endpoint to drain.
    pub async fn close(self) {
        self.connection.close(VarInt::from_u32(0), b"done");
        self.endpoint.wait_idle().await;
    }
}

/// Accept delivery streams from the relay and forward their payloads.
///
/// Streams are read one at a time, preserving the relay's delivery order
/// for this session. Ends when the session dies or the receiver is dropped.
async fn receive_loop(
    connection: quinn::Connection,
    incoming_tx: mpsc::Sender<Bytes>,
    max_message_size: usize,
) {
    loop {
        let mut stream = match connection.accept_uni().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::debug!(error = %e, "relay session ended");
                return;
            }
        };

        match stream.read_to_end(max_message_size).await {
            Ok(payload) => {
                if incoming_tx.send(Bytes::from(payload)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "dropping unreadable broadcast");
            }
        }
    }
}
