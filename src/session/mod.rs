//! Per-session lifecycle
//!
//! Each session gets one [`SessionSupervisor`] task that owns its lifecycle
//! from registration to close, and one reader task per inbound stream.

pub mod reader;
pub mod state;
pub mod supervisor;

pub use state::{SessionPhase, SessionState};
pub use supervisor::SessionSupervisor;
