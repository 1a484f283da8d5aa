//! Port negotiation.

use std::io;
use std::net::{TcpListener, ToSocketAddrs};
use tracing::debug;

use super::DevError;

/// Answers whether a port is free on a host.
pub trait PortProbe {
    fn is_free(&self, host: &str, port: u16) -> Result<bool, DevError>;
}

/// Probes by binding a TCP listener on every address the host resolves to.
/// The listeners are dropped before returning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl PortProbe for TcpProbe {
    fn is_free(&self, host: &str, port: u16) -> Result<bool, DevError> {
        let addrs: Vec<_> = (host, port)
            .to_socket_addrs()
            .map_err(|e| DevError::Resolve {
                host: host.to_string(),
                message: e.to_string(),
            })?
            .collect();

        let mut bound = Vec::with_capacity(addrs.len());
        let mut last_error = None;
        for addr in &addrs {
            match TcpListener::bind(addr) {
                Ok(listener) => bound.push(listener),
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => return Ok(false),
                // e.g. IPv6 disabled; not a conflict on this address.
                Err(e) => last_error = Some(e),
            }
        }

        match (bound.is_empty(), last_error) {
            (true, Some(e)) => Err(DevError::Bind {
                host: host.to_string(),
                port,
                message: e.to_string(),
            }),
            _ => Ok(true),
        }
    }
}

/// Result of port negotiation. Final for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDecision {
    pub requested: u16,
    pub port: u16,
}

impl PortDecision {
    /// True when the requested port was busy and another was chosen.
    pub fn substituted(&self) -> bool {
        self.requested != self.port
    }
}

/// Find a free port on `host`, starting at `preferred` and walking upward.
pub fn negotiate_port(
    probe: &dyn PortProbe,
    host: &str,
    preferred: u16,
) -> Result<PortDecision, DevError> {
    let mut port = preferred;
    loop {
        if probe.is_free(host, port)? {
            debug!(host, requested = preferred, port, "port negotiated");
            return Ok(PortDecision {
                requested: preferred,
                port,
            });
        }
        port = port.checked_add(1).ok_or_else(|| DevError::NoFreePort {
            host: host.to_string(),
            from: preferred,
        })?;
    }
}
