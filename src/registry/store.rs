//! Session registry implementation
//!
//! The central set of sessions eligible for broadcast. Mutated by session
//! join/leave events, snapshotted by the broadcaster.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::entry::{SessionEntry, SessionId};
use super::error::RegistryError;

/// Registry of all active sessions.
///
/// Generic over the session handle type so the core can be driven by any
/// transport. Thread-safe via `RwLock`; all operations are safe to call
/// concurrently from arbitrarily many tasks.
pub struct SessionRegistry<S> {
    sessions: RwLock<HashMap<SessionId, SessionEntry<S>>>,
}

impl<S: Clone> SessionRegistry<S> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a session, making it eligible to receive broadcasts.
    ///
    /// Registering an id that is already present is an invariant violation:
    /// the existing entry is left untouched and
    /// [`RegistryError::DuplicateSession`] is returned after logging loudly.
    pub async fn register(&self, id: SessionId, session: S) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&id) {
            tracing::error!(session = %id, "duplicate session registration");
            return Err(RegistryError::DuplicateSession(id));
        }

        sessions.insert(id, SessionEntry::new(session));
        tracing::info!(session = %id, active = sessions.len(), "session registered");
        Ok(())
    }

    /// Remove a session.
    ///
    /// Removing an absent session is a no-op (returns `false`); error paths
    /// may race on cleanup and both are allowed to try.
    pub async fn unregister(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.write().await;

        match sessions.remove(&id) {
            Some(entry) => {
                tracing::info!(
                    session = %id,
                    active = sessions.len(),
                    connected_for = ?entry.meta.joined_at.elapsed(),
                    "session unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Copy out the current membership, minus the optional exclusion.
    ///
    /// The returned handles can be iterated without holding the registry
    /// lock, so delivery I/O never blocks join/leave events.
    pub async fn snapshot(&self, excluding: Option<SessionId>) -> Vec<(SessionId, S)> {
        let sessions = self.sessions.read().await;

        sessions
            .iter()
            .filter(|(id, _)| Some(**id) != excluding)
            .map(|(id, entry)| (*id, entry.session.clone()))
            .collect()
    }

    /// Whether a session is currently registered.
    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl<S: Clone> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_snapshot() {
        let registry = SessionRegistry::new();

        registry.register(SessionId::new(1), "a").await.unwrap();
        registry.register(SessionId::new(2), "b").await.unwrap();

        assert_eq!(registry.len().await, 2);
        assert!(registry.contains(SessionId::new(1)).await);

        let mut snapshot = registry.snapshot(None).await;
        snapshot.sort_by_key(|(id, _)| *id);
        assert_eq!(
            snapshot,
            vec![(SessionId::new(1), "a"), (SessionId::new(2), "b")]
        );
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_an_error() {
        let registry = SessionRegistry::new();

        registry.register(SessionId::new(1), "a").await.unwrap();
        let result = registry.register(SessionId::new(1), "a2").await;

        assert_eq!(
            result,
            Err(RegistryError::DuplicateSession(SessionId::new(1)))
        );
        // The original entry survives.
        assert_eq!(registry.snapshot(None).await, vec![(SessionId::new(1), "a")]);
    }

    #[tokio::test]
    async fn test_unregister_absent_is_noop() {
        let registry: SessionRegistry<&str> = SessionRegistry::new();

        assert!(!registry.unregister(SessionId::new(9)).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_unregister_removes_exactly_once() {
        let registry = SessionRegistry::new();

        registry.register(SessionId::new(1), "a").await.unwrap();
        assert!(registry.unregister(SessionId::new(1)).await);
        assert!(!registry.unregister(SessionId::new(1)).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_excludes_sender() {
        let registry = SessionRegistry::new();

        registry.register(SessionId::new(1), "a").await.unwrap();
        registry.register(SessionId::new(2), "b").await.unwrap();
        registry.register(SessionId::new(3), "c").await.unwrap();

        let mut snapshot = registry.snapshot(Some(SessionId::new(2))).await;
        snapshot.sort_by_key(|(id, _)| *id);
        assert_eq!(
            snapshot,
            vec![(SessionId::new(1), "a"), (SessionId::new(3), "c")]
        );
    }

    #[tokio::test]
    async fn test_snapshot_of_empty_registry() {
        let registry: SessionRegistry<&str> = SessionRegistry::new();

        assert!(registry.snapshot(None).await.is_empty());
        assert!(registry.snapshot(Some(SessionId::new(1))).await.is_empty());
    }
}
