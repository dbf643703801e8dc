//! End-to-end relay behavior over the in-memory transport.
//!
//! Each test wires real supervisors, readers, and the broadcaster together
//! exactly as the server does, with `transport::mem` standing in for QUIC.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use relay_rs::broadcast::Broadcaster;
use relay_rs::registry::{SessionId, SessionRegistry};
use relay_rs::session::SessionSupervisor;
use relay_rs::stats::RelayStats;
use relay_rs::transport::{
    session_pair, InboundStream, MemSession, OutboundStream, RelaySession,
};

/// A relay core with no network: sessions join over `transport::mem`.
struct TestRelay {
    registry: Arc<SessionRegistry<MemSession>>,
    broadcaster: Arc<Broadcaster<MemSession>>,
    stats: Arc<RelayStats>,
    next_id: AtomicU64,
}

/// A joined client: the local half of the pair, plus the server-side half
/// for fault injection.
struct TestClient {
    id: SessionId,
    local: MemSession,
    remote: MemSession,
}

impl TestRelay {
    fn new() -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let stats = Arc::new(RelayStats::new());
        let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&registry), Arc::clone(&stats)));
        Self {
            registry,
            broadcaster,
            stats,
            next_id: AtomicU64::new(1),
        }
    }

    /// Connect a client and wait until its supervisor has registered it.
    async fn join(&self) -> TestClient {
        let (remote, local) = session_pair();
        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        let supervisor = SessionSupervisor::new(
            id,
            remote.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.broadcaster),
            Arc::clone(&self.stats),
            1024,
        );
        tokio::spawn(supervisor.run());

        while !self.registry.contains(id).await {
            tokio::task::yield_now().await;
        }

        TestClient { id, local, remote }
    }

    async fn wait_until_unregistered(&self, id: SessionId) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while self.registry.contains(id).await {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("session was not unregistered in time");
    }
}

impl TestClient {
    /// Send one message on a fresh stream.
    async fn send(&self, payload: &[u8]) {
        let mut stream = self.local.open_stream().await.unwrap();
        stream.write_all(payload).await.unwrap();
        stream.finish().unwrap();
    }

    /// Send several messages back-to-back on a single stream.
    async fn send_on_one_stream(&self, payloads: &[&[u8]]) {
        let mut stream = self.local.open_stream().await.unwrap();
        for payload in payloads {
            stream.write_all(payload).await.unwrap();
        }
        stream.finish().unwrap();
    }

    /// Receive the next broadcast in full.
    async fn recv(&self) -> Vec<u8> {
        let mut stream = tokio::time::timeout(Duration::from_secs(1), self.local.accept_stream())
            .await
            .expect("timed out waiting for a broadcast")
            .unwrap();

        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        while let Some(n) = stream.read(&mut buf).await.unwrap() {
            data.extend_from_slice(&buf[..n]);
        }
        data
    }

    /// Assert that no broadcast arrives within a grace window.
    async fn assert_no_delivery(&self) {
        let result =
            tokio::time::timeout(Duration::from_millis(150), self.local.accept_stream()).await;
        assert!(result.is_err(), "unexpected delivery");
    }
}

#[tokio::test]
async fn fanout_reaches_every_other_session() {
    let relay = TestRelay::new();
    let a = relay.join().await;
    let b = relay.join().await;
    let c = relay.join().await;
    let d = relay.join().await;

    a.send(b"hi").await;

    assert_eq!(b.recv().await, b"hi");
    assert_eq!(c.recv().await, b"hi");
    assert_eq!(d.recv().await, b"hi");
    a.assert_no_delivery().await;
}

#[tokio::test]
async fn no_self_delivery_and_exactly_one_stream_per_recipient() {
    let relay = TestRelay::new();
    let a = relay.join().await;
    let b = relay.join().await;
    let c = relay.join().await;

    a.send(b"hi").await;

    assert_eq!(b.recv().await, b"hi");
    assert_eq!(c.recv().await, b"hi");

    // Exactly one delivery each, none for the sender.
    a.assert_no_delivery().await;
    b.assert_no_delivery().await;
    c.assert_no_delivery().await;
}

#[tokio::test]
async fn one_broken_recipient_does_not_block_the_others() {
    let relay = TestRelay::new();
    let a = relay.join().await;
    let b = relay.join().await;
    let c = relay.join().await;

    b.remote.set_open_fault(true);
    a.send(b"partial").await;

    assert_eq!(c.recv().await, b"partial");
    b.assert_no_delivery().await;

    // The failed delivery did not deregister the recipient.
    assert!(relay.registry.contains(b.id).await);

    // Once the fault clears, the recipient is reachable again.
    b.remote.set_open_fault(false);
    a.send(b"again").await;
    assert_eq!(b.recv().await, b"again");
    assert_eq!(c.recv().await, b"again");
}

#[tokio::test]
async fn disconnect_cleans_up_and_broadcasts_reach_no_one() {
    let relay = TestRelay::new();
    let a = relay.join().await;
    let b = relay.join().await;

    a.local.close(0, "bye");
    relay.wait_until_unregistered(a.id).await;
    assert_eq!(relay.registry.len().await, 1);

    // Nothing left to deliver to; sending must not error or deliver.
    b.send(b"anyone?").await;
    b.assert_no_delivery().await;

    let stats = relay.stats.snapshot();
    assert_eq!(stats.sessions_active(), 1);
}

#[tokio::test]
async fn per_sender_messages_arrive_in_order() {
    let relay = TestRelay::new();
    let a = relay.join().await;
    let b = relay.join().await;
    let c = relay.join().await;

    a.send_on_one_stream(&[b"first", b"second", b"third"]).await;

    for recipient in [&b, &c] {
        assert_eq!(recipient.recv().await, b"first");
        assert_eq!(recipient.recv().await, b"second");
        assert_eq!(recipient.recv().await, b"third");
    }
}

#[tokio::test]
async fn back_to_back_sends_never_corrupt_in_flight_payloads() {
    let relay = TestRelay::new();
    let a = relay.join().await;
    let b = relay.join().await;

    let first = vec![b'a'; 600];
    let second = vec![b'b'; 600];
    a.send_on_one_stream(&[&first, &second]).await;

    assert_eq!(b.recv().await, first);
    assert_eq!(b.recv().await, second);
}

#[tokio::test]
async fn stats_track_messages_and_deliveries() {
    let relay = TestRelay::new();
    let a = relay.join().await;
    let b = relay.join().await;
    let c = relay.join().await;

    a.send(b"count me").await;
    assert_eq!(b.recv().await, b"count me");
    assert_eq!(c.recv().await, b"count me");

    let stats = relay.stats.snapshot();
    assert_eq!(stats.sessions_joined, 3);
    assert_eq!(stats.messages_received, 1);
    assert_eq!(stats.bytes_received, 8);
    assert_eq!(stats.deliveries_attempted, 2);
    assert_eq!(stats.deliveries_failed, 0);
}
