//! Ctrl+C handling for the dev session
//!
//! The bridge process shares the terminal's process group, so it receives
//! the same SIGINT and shuts its server down; `DevServer::start` then
//! returns and the session ends normally.
//!
//! A second Ctrl+C exits immediately with [`EXIT_CODE_INTERRUPTED`].

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Exit code after a forced exit (128 + SIGINT)
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Signal handler state
#[derive(Debug, Default)]
pub struct SignalState {
    /// First signal received
    stop_requested: AtomicBool,
    /// Second signal received
    force_exit: AtomicBool,
    signal_count: AtomicU8,
}

impl SignalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn is_force_exit(&self) -> bool {
        self.force_exit.load(Ordering::SeqCst)
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// Record a signal and decide what to do about it.
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);

        match count {
            0 => {
                self.stop_requested.store(true, Ordering::SeqCst);
                SignalAction::RequestStop
            }
            1 => {
                self.force_exit.store(true, Ordering::SeqCst);
                SignalAction::ForceExit
            }
            _ => SignalAction::Ignore,
        }
    }
}

/// Action to take after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Let the server wind down
    RequestStop,
    /// Exit without waiting
    ForceExit,
    Ignore,
}

pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SignalState::new()),
        }
    }

    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }

    /// Install the process-wide handler. Call once.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let state = Arc::clone(&self.state);
        ctrlc::set_handler(move || match state.handle_signal() {
            SignalAction::RequestStop => {
                eprintln!("\nStopping dev server (press Ctrl+C again to force)...");
            }
            SignalAction::ForceExit => {
                eprintln!("\nForced exit");
                std::process::exit(EXIT_CODE_INTERRUPTED);
            }
            SignalAction::Ignore => {}
        })
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
