//! Session registry for broadcast fan-out
//!
//! The registry is the single source of truth for which sessions receive
//! broadcasts. Supervisors add a session exactly once when it is
//! established and remove it exactly once when it terminates; the
//! broadcaster iterates snapshots taken between those two points.
//!
//! # Architecture
//!
//! ```text
//!                    Arc<SessionRegistry<S>>
//!               ┌───────────────────────────────┐
//!               │ sessions: HashMap<SessionId,  │
//!               │   SessionEntry {              │
//!               │     session: S,               │
//!               │     meta,                     │
//!               │   }                           │
//!               │ >                             │
//!               └──────────────┬────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!   [Supervisor]          [Supervisor]         [Broadcaster]
//!   register()            unregister()         snapshot(excluding)
//! ```
//!
//! # Lock discipline
//!
//! The backing map is guarded by an `RwLock` held only for the duration of
//! a mutation or a snapshot copy — never across a network write. The
//! broadcaster delivers against its own snapshot, so a slow recipient never
//! blocks registration of new sessions.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{SessionEntry, SessionId, SessionMeta};
pub use error::RegistryError;
pub use store::SessionRegistry;
