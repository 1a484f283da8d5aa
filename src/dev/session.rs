//! Dev session: the state machine that makes every reporting decision.

use bean_protocol::StatsReport;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::build::{diagnostics, Diagnostic};

use super::port::PortDecision;
use super::server::SessionAddress;
use super::state::{DevState, DevStateError};

/// Something the session wants the user to see.
#[derive(Debug, Clone, PartialEq)]
pub enum DevNotice {
    /// The requested port was busy.
    PortSubstituted { requested: u16, port: u16 },
    /// A watched file changed.
    Recompiling { file: Option<String> },
    /// Warnings and errors of one compile, in full.
    Diagnostics(Vec<Diagnostic>),
    /// The compile had errors; the previous output is still served.
    CompileFailed { errors: usize, elapsed: Duration },
    /// First successful compile of the session.
    Ready {
        local: String,
        network: Option<String>,
        elapsed: Duration,
    },
    /// Any later successful compile.
    Recompiled { elapsed: Duration },
    /// Session over.
    Stopped { compiles: u32 },
}

/// Input from the compiler hooks.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Invalid { file: Option<String>, at: Instant },
    Done { stats: StatsReport, at: Instant },
}

#[derive(Debug)]
pub struct DevSession {
    state: DevState,
    address: Option<SessionAddress>,
    /// Completed compiles, failed ones included.
    compiles: u32,
    /// Set by the first compile without errors.
    announced: bool,
    /// When the compile in flight started.
    compile_started: Instant,
}

impl DevSession {
    pub fn new(started: Instant) -> Self {
        Self {
            state: DevState::Initializing,
            address: None,
            compiles: 0,
            announced: false,
            compile_started: started,
        }
    }

    pub fn state(&self) -> DevState {
        self.state
    }

    pub fn compiles(&self) -> u32 {
        self.compiles
    }

    pub fn address(&self) -> Option<&SessionAddress> {
        self.address.as_ref()
    }

    fn transition(&mut self, to: DevState) -> Result<(), DevStateError> {
        if !self.state.can_transition_to(to) {
            return Err(DevStateError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!(from = ?self.state, to = ?to, "dev session transition");
        self.state = to;
        Ok(())
    }

    pub fn begin_negotiation(&mut self) -> Result<(), DevStateError> {
        self.transition(DevState::PortNegotiation)
    }

    /// Record the negotiated port and move on to starting the server.
    pub fn port_negotiated(&mut self, decision: &PortDecision) -> Result<Vec<DevNotice>, DevStateError> {
        self.transition(DevState::Starting)?;
        let mut notices = Vec::new();
        if decision.substituted() {
            notices.push(DevNotice::PortSubstituted {
                requested: decision.requested,
                port: decision.port,
            });
        }
        Ok(notices)
    }

    pub fn set_address(&mut self, address: SessionAddress) {
        self.address = Some(address);
    }

    /// End the session. Safe to call more than once.
    pub fn terminate(&mut self) -> Vec<DevNotice> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        self.state = DevState::Terminated;
        vec![DevNotice::Stopped {
            compiles: self.compiles,
        }]
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<DevNotice> {
        match event {
            SessionEvent::Invalid { file, at } => self.on_invalid(file, at),
            SessionEvent::Done { stats, at } => self.on_done(&stats, at),
        }
    }

    fn on_invalid(&mut self, file: Option<String>, at: Instant) -> Vec<DevNotice> {
        match self.state {
            DevState::Starting | DevState::Serving => {
                self.state = DevState::Recompiling;
                self.compile_started = at;
                vec![DevNotice::Recompiling { file }]
            }
            // The compiler folds further changes into the pass in flight.
            DevState::Recompiling => {
                debug!(file = ?file, "change during recompile");
                Vec::new()
            }
            state => {
                warn!(state = ?state, "invalidation outside a live session ignored");
                Vec::new()
            }
        }
    }

    fn on_done(&mut self, stats: &StatsReport, at: Instant) -> Vec<DevNotice> {
        match self.state {
            DevState::Starting | DevState::Serving | DevState::Recompiling => {}
            state => {
                warn!(state = ?state, "compile result outside a live session ignored");
                return Vec::new();
            }
        }
        self.state = DevState::Serving;
        self.compiles += 1;

        let elapsed = stats
            .time_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| at.saturating_duration_since(self.compile_started));

        let mut notices = Vec::new();
        if stats.has_errors() || stats.has_warnings() {
            notices.push(DevNotice::Diagnostics(diagnostics(stats)));
        }

        if stats.has_errors() {
            notices.push(DevNotice::CompileFailed {
                errors: stats.errors.len(),
                elapsed,
            });
            return notices;
        }

        match (&self.address, self.announced) {
            (Some(address), false) => {
                self.announced = true;
                notices.push(DevNotice::Ready {
                    local: address.local_url(),
                    network: address.network_url(),
                    elapsed,
                });
            }
            _ => notices.push(DevNotice::Recompiled { elapsed }),
        }
        notices
    }
}
