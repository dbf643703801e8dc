//! Statistics and metrics for the relay

use std::sync::atomic::{AtomicU64, Ordering};

/// Server-wide counters, shared by the accept loop, supervisors, and the
/// broadcaster. Cheap to update from any task.
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Sessions registered over the server's lifetime.
    sessions_joined: AtomicU64,
    /// Sessions unregistered over the server's lifetime.
    sessions_left: AtomicU64,
    /// Messages read from inbound streams.
    messages_received: AtomicU64,
    /// Per-recipient deliveries attempted.
    deliveries_attempted: AtomicU64,
    /// Per-recipient deliveries that failed (open, write, or timeout).
    deliveries_failed: AtomicU64,
    /// Payload bytes handed to the broadcaster.
    bytes_received: AtomicU64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_session_joined(&self) {
        self.sessions_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_left(&self) {
        self.sessions_left.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message(&self, bytes: usize) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_delivery(&self, succeeded: bool) {
        self.deliveries_attempted.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.deliveries_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copy out the current counter values.
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            sessions_joined: self.sessions_joined.load(Ordering::Relaxed),
            sessions_left: self.sessions_left.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            deliveries_attempted: self.deliveries_attempted.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`RelayStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    pub sessions_joined: u64,
    pub sessions_left: u64,
    pub messages_received: u64,
    pub deliveries_attempted: u64,
    pub deliveries_failed: u64,
    pub bytes_received: u64,
}

impl RelayStatsSnapshot {
    /// Sessions currently active according to the counters.
    pub fn sessions_active(&self) -> u64 {
        self.sessions_joined.saturating_sub(self.sessions_left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = RelayStats::new();

        stats.record_session_joined();
        stats.record_session_joined();
        stats.record_session_left();
        stats.record_message(512);
        stats.record_message(100);
        stats.record_delivery(true);
        stats.record_delivery(false);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sessions_joined, 2);
        assert_eq!(snapshot.sessions_left, 1);
        assert_eq!(snapshot.sessions_active(), 1);
        assert_eq!(snapshot.messages_received, 2);
        assert_eq!(snapshot.bytes_received, 612);
        assert_eq!(snapshot.deliveries_attempted, 2);
        assert_eq!(snapshot.deliveries_failed, 1);
    }

    #[test]
    fn test_active_sessions_never_underflows() {
        let stats = RelayStats::new();
        stats.record_session_left();
        assert_eq!(stats.snapshot().sessions_active(), 0);
    }
}
