//! Registry entry types
//!
//! This module defines the per-session record stored in the registry and the
//! identifier used to key it.

use std::time::Instant;

/// Unique identifier for a session.
///
/// Allocated from an atomic counter when the transport hands the server a
/// new session; used as the registry key so that no part of the core relies
/// on handle identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lightweight per-session metadata.
///
/// Reserved for future client attributes; today it only records when the
/// session joined.
#[derive(Debug, Clone)]
pub struct SessionMeta {
    /// When the session was registered.
    pub joined_at: Instant,
}

impl SessionMeta {
    pub fn new() -> Self {
        Self {
            joined_at: Instant::now(),
        }
    }
}

impl Default for SessionMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry for a single session in the registry.
#[derive(Debug, Clone)]
pub struct SessionEntry<S> {
    /// Handle used to open outbound delivery streams.
    pub session: S,
    /// Per-session metadata.
    pub meta: SessionMeta,
}

impl<S> SessionEntry<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            meta: SessionMeta::new(),
        }
    }
}
