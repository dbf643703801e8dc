//! Session supervisor
//!
//! Top-level per-session control loop: register, accept inbound streams,
//! spawn a reader per stream, and on accept failure unregister and close
//! the session.

use std::sync::Arc;

use crate::broadcast::Broadcaster;
use crate::registry::{SessionId, SessionRegistry};
use crate::stats::RelayStats;
use crate::transport::RelaySession;

use super::reader;
use super::state::SessionState;

/// Application close code sent when the relay tears a session down.
pub const CLOSE_GOING_AWAY: u32 = 1234;

const CLOSE_REASON: &str = "leaving";
const CLOSE_REASON_DUPLICATE: &str = "duplicate session";

/// Owns one session from establishment to close.
pub struct SessionSupervisor<S: RelaySession> {
    state: SessionState,
    session: S,
    registry: Arc<SessionRegistry<S>>,
    broadcaster: Arc<Broadcaster<S>>,
    stats: Arc<RelayStats>,
    read_buffer_size: usize,
}

impl<S: RelaySession> SessionSupervisor<S> {
    pub fn new(
        id: SessionId,
        session: S,
        registry: Arc<SessionRegistry<S>>,
        broadcaster: Arc<Broadcaster<S>>,
        stats: Arc<RelayStats>,
        read_buffer_size: usize,
    ) -> Self {
        Self {
            state: SessionState::new(id),
            session,
            registry,
            broadcaster,
            stats,
            read_buffer_size,
        }
    }

    /// Run the session to completion.
    ///
    /// Individual stream reader failures do not terminate the session; only
    /// a failure of the accept path does. By the time this returns, the
    /// session is out of the registry and closed.
    pub async fn run(mut self) {
        let id = self.state.id;

        if let Err(e) = self.registry.register(id, self.session.clone()).await {
            // The registry kept the original entry; close this handle
            // without unregistering, or we would tear down the live session.
            tracing::error!(session = %id, error = %e, "session registration failed");
            self.session.close(CLOSE_GOING_AWAY, CLOSE_REASON_DUPLICATE);
            self.state.mark_closed();
            return;
        }
        self.stats.record_session_joined();

        let accept_error = loop {
            match self.session.accept_stream().await {
                Ok(stream) => {
                    self.state.on_stream_accepted();
                    let broadcaster = Arc::clone(&self.broadcaster);
                    let buffer_size = self.read_buffer_size;
                    tokio::spawn(async move {
                        if let Err(e) =
                            reader::run_reader::<S>(stream, id, broadcaster, buffer_size).await
                        {
                            tracing::debug!(session = %id, error = %e, "stream reader stopped");
                        }
                    });
                }
                Err(e) => break e,
            }
        };

        self.state.begin_termination();
        tracing::debug!(
            session = %id,
            error = %accept_error,
            streams = self.state.streams_accepted,
            connected_for = ?self.state.duration(),
            "session terminating"
        );

        self.registry.unregister(id).await;
        self.stats.record_session_left();
        self.session.close(CLOSE_GOING_AWAY, CLOSE_REASON);
        self.state.mark_closed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{session_pair, InboundStream, MemSession, OutboundStream};

    struct Relay {
        registry: Arc<SessionRegistry<MemSession>>,
        broadcaster: Arc<Broadcaster<MemSession>>,
        stats: Arc<RelayStats>,
    }

    impl Relay {
        fn new() -> Self {
            let registry = Arc::new(SessionRegistry::new());
            let stats = Arc::new(RelayStats::new());
            let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&registry), Arc::clone(&stats)));
            Self {
                registry,
                broadcaster,
                stats,
            }
        }

        fn supervise(&self, id: u64, session: MemSession) -> tokio::task::JoinHandle<()> {
            let supervisor = SessionSupervisor::new(
                SessionId::new(id),
                session,
                Arc::clone(&self.registry),
                Arc::clone(&self.broadcaster),
                Arc::clone(&self.stats),
                1024,
            );
            tokio::spawn(supervisor.run())
        }
    }

    async fn wait_for_registration(relay: &Relay, id: u64) {
        while !relay.registry.contains(SessionId::new(id)).await {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_session_registered_while_accepting() {
        let relay = Relay::new();
        let (remote, local) = session_pair();

        let handle = relay.supervise(1, remote);
        wait_for_registration(&relay, 1).await;
        assert_eq!(relay.registry.len().await, 1);

        local.close(0, "client gone");
        handle.await.unwrap();

        assert!(relay.registry.is_empty().await);
        assert_eq!(local.close_reason(), Some((0, "client gone".to_string())));
        assert_eq!(relay.stats.snapshot().sessions_active(), 0);
    }

    #[tokio::test]
    async fn test_accept_error_closes_with_going_away() {
        let relay = Relay::new();
        let (remote, local) = session_pair();

        let observer = remote.clone();
        let handle = relay.supervise(1, remote);
        wait_for_registration(&relay, 1).await;

        // Dropping the peer half ends the accept loop without a close frame,
        // so the supervisor's own close is the one recorded.
        drop(local);
        handle.await.unwrap();

        assert!(relay.registry.is_empty().await);
        assert_eq!(
            observer.close_reason(),
            Some((CLOSE_GOING_AWAY, "leaving".to_string()))
        );
    }

    #[tokio::test]
    async fn test_messages_flow_between_supervised_sessions() {
        let relay = Relay::new();
        let (a_remote, a_local) = session_pair();
        let (b_remote, b_local) = session_pair();

        relay.supervise(1, a_remote);
        relay.supervise(2, b_remote);
        wait_for_registration(&relay, 1).await;
        wait_for_registration(&relay, 2).await;

        let mut out = a_local.open_stream().await.unwrap();
        out.write_all(b"hello b").await.unwrap();
        out.finish().unwrap();

        let mut incoming = b_local.accept_stream().await.unwrap();
        let mut buf = [0u8; 16];
        let n = incoming.read(&mut buf).await.unwrap().unwrap();
        assert_eq!(&buf[..n], b"hello b");
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_original_session() {
        let relay = Relay::new();
        let (first_remote, _first_local) = session_pair();
        let (dup_remote, _dup_local) = session_pair();

        relay.supervise(1, first_remote);
        wait_for_registration(&relay, 1).await;

        // Same id again: the duplicate must be closed and the original kept.
        let handle = relay.supervise(1, dup_remote.clone());
        handle.await.unwrap();

        assert_eq!(relay.registry.len().await, 1);
        assert_eq!(
            dup_remote.close_reason(),
            Some((CLOSE_GOING_AWAY, "duplicate session".to_string()))
        );
    }
}
