//! Session controller (C2): `Uninitialized -> Ready -> Shutdown`.
//!
//! Generalizes the teacher's single `initialized: bool` flag
//! (`casparian_mcp::server::McpServer`) into an explicit three-state machine,
//! since spec §4.2 also names a terminal `Shutdown` state reached on stdin
//! EOF, not just the initialize handshake.

use std::sync::atomic::{AtomicU8, Ordering};

const UNINITIALIZED: u8 = 0;
const READY: u8 = 1;
const SHUTDOWN: u8 = 2;

/// The one protocol version this server accepts (spec §6).
pub const REQUIRED_PROTOCOL_VERSION: &str = crate::protocol::MCP_PROTOCOL_VERSION;

/// Shareable across worker tasks: `Arc<SessionController>`, mutated only by
/// the router (the sole reader/writer of session state per spec §4.3).
pub struct SessionController {
    state: AtomicU8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Shutdown,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(UNINITIALIZED),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::SeqCst) {
            READY => SessionState::Ready,
            SHUTDOWN => SessionState::Shutdown,
            _ => SessionState::Uninitialized,
        }
    }

    /// Complete the handshake. Idempotent: a second `initialize` simply
    /// re-confirms readiness rather than erroring, matching the teacher's
    /// unconditional `self.initialized = true`.
    pub fn mark_ready(&self) {
        self.state.store(READY, Ordering::SeqCst);
    }

    pub fn mark_shutdown(&self) {
        self.state.store(SHUTDOWN, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized() {
        let session = SessionController::new();
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(!session.is_ready());
    }

    #[test]
    fn transitions_through_the_full_lifecycle() {
        let session = SessionController::new();
        session.mark_ready();
        assert!(session.is_ready());
        session.mark_shutdown();
        assert_eq!(session.state(), SessionState::Shutdown);
        assert!(!session.is_ready());
    }
}
