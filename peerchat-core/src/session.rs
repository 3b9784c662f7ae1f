//! Session lifecycle: role and the Running -> Terminating -> Stopped machine.

use std::sync::atomic::{AtomicU8, Ordering};

/// Which side of the rendezvous this process is. Fixed for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Binds first and waits for the first inbound datagram.
    Host,
    /// Knows the host's endpoint up front and sends the first probe.
    Client,
}

/// Lifecycle of one chat session. Transitions are monotonic; there is no way
/// back to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminating,
    Stopped,
}

const RUNNING: u8 = 0;
const TERMINATING: u8 = 1;
const STOPPED: u8 = 2;

/// Shared session-state handle. Both loops read it; only forward transitions
/// are possible, so a stale read can only under-report progress.
pub struct Session {
    state: AtomicU8,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(RUNNING),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => SessionState::Running,
            TERMINATING => SessionState::Terminating,
            _ => SessionState::Stopped,
        }
    }

    /// True once shutdown has begun (Terminating or Stopped).
    pub fn is_terminating(&self) -> bool {
        self.state.load(Ordering::Acquire) != RUNNING
    }

    /// Move Running -> Terminating. Returns true only for the first caller;
    /// later calls (and calls after Stopped) change nothing.
    pub fn begin_termination(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, TERMINATING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Move Terminating -> Stopped once both loops have exited.
    pub fn mark_stopped(&self) {
        let _ = self.state.compare_exchange(
            TERMINATING,
            STOPPED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
