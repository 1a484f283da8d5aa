//! Dev orchestrator
//!
//! Negotiates a port, builds the server options, starts the dev server and
//! turns the compiler's invalidation/done hooks into user notices through
//! [`DevSession`].

mod port;
mod server;
mod session;
mod state;

use bean_protocol::StatsReport;
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::compiler::{CompilerError, CompilerHooks, Toolchain};
use crate::config::defaults::{DEFAULT_HOST, DEFAULT_PORT};
use crate::config::ProjectConfig;
use crate::report::Reporter;

pub use port::{negotiate_port, PortDecision, PortProbe, TcpProbe};
pub use server::{lan_ipv4, server_options, uses_https, SessionAddress};
pub use session::{DevNotice, DevSession, SessionEvent};
pub use state::{DevState, DevStateError};

/// Dev orchestrator errors
#[derive(Debug, Error)]
pub enum DevError {
    #[error("cannot resolve dev server host {host}: {message}")]
    Resolve { host: String, message: String },

    #[error("cannot bind {host}:{port}: {message}")]
    Bind {
        host: String,
        port: u16,
        message: String,
    },

    #[error("no free port on {host} at or above {from}")]
    NoFreePort { host: String, from: u16 },

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error(transparent)]
    State(#[from] DevStateError),
}

impl DevError {
    /// Port and host problems, as opposed to compiler failures.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            DevError::Resolve { .. } | DevError::Bind { .. } | DevError::NoFreePort { .. }
        )
    }
}

/// Command-line choices for one dev session.
#[derive(Debug, Clone, Default)]
pub struct DevOptions {
    /// Wins over the project's `dev_server.port`.
    pub port: Option<u16>,
    pub open: bool,
}

/// What a finished session looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevSummary {
    pub address: SessionAddress,
    pub compiles: u32,
}

/// Routes compiler hooks through the session and out to the reporter.
struct SessionHooks<'a> {
    session: &'a mut DevSession,
    reporter: &'a mut dyn Reporter,
}

impl SessionHooks<'_> {
    fn dispatch(&mut self, event: SessionEvent) {
        for notice in self.session.handle(event) {
            self.reporter.dev_notice(&notice);
        }
    }
}

impl CompilerHooks for SessionHooks<'_> {
    fn invalid(&mut self, file: Option<&str>) {
        self.dispatch(SessionEvent::Invalid {
            file: file.map(str::to_string),
            at: Instant::now(),
        });
    }

    fn done(&mut self, stats: &StatsReport) {
        self.dispatch(SessionEvent::Done {
            stats: stats.clone(),
            at: Instant::now(),
        });
    }
}

/// Run a dev session until the server stops.
///
/// Blocks for the life of the server. Returns `Ok` when the server ends
/// normally (e.g. after Ctrl+C) and `Err` when it cannot start or dies.
pub fn serve(
    project: &ProjectConfig,
    config: &Value,
    options: &DevOptions,
    toolchain: &dyn Toolchain,
    probe: &dyn PortProbe,
    reporter: &mut dyn Reporter,
) -> Result<DevSummary, DevError> {
    let mut session = DevSession::new(Instant::now());

    let host = project
        .dev_server
        .host
        .clone()
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let preferred = options
        .port
        .or(project.dev_server.port)
        .unwrap_or(DEFAULT_PORT);

    session.begin_negotiation()?;
    let decision = negotiate_port(probe, &host, preferred)?;
    for notice in session.port_negotiated(&decision)? {
        reporter.dev_notice(&notice);
    }

    let server_options = server_options(project, &host, &decision, options.open);
    let address = SessionAddress {
        https: uses_https(&server_options),
        host: host.clone(),
        port: decision.port,
        lan_ip: lan_ipv4(),
    };
    session.set_address(address.clone());
    debug!(options = %server_options, "dev server options");

    let mut server = match toolchain.dev_server(config, &server_options) {
        Ok(server) => server,
        Err(e) => {
            session.terminate();
            return Err(e.into());
        }
    };

    info!(host = %host, port = decision.port, "starting dev server");
    let started = {
        let mut hooks = SessionHooks {
            session: &mut session,
            reporter: &mut *reporter,
        };
        server.start(&mut hooks)
    };

    if let Err(e) = started {
        session.terminate();
        return Err(e.into());
    }

    for notice in session.terminate() {
        reporter.dev_notice(&notice);
    }
    Ok(DevSummary {
        address,
        compiles: session.compiles(),
    })
}
