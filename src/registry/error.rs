//! Registry error types

use super::entry::SessionId;

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A session was registered twice. An internal invariant violation:
    /// supervisors register each session exactly once.
    DuplicateSession(SessionId),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateSession(id) => {
                write!(f, "session already registered: {}", id)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
