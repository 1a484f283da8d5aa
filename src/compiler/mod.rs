//! Compiler seam
//!
//! The bundler itself is external. These traits are the only way the
//! orchestrators reach it:
//! - [`Toolchain`]: factory for compilers and dev servers
//! - [`Compiler`]: one-shot `run` plus `close`
//! - [`DevServer`]: a watching server that reports through [`CompilerHooks`]
//!
//! [`BridgeToolchain`] drives a bridge process over stdio; the mock module
//! provides an in-process implementation for tests.

mod bridge;

use bean_protocol::{ProtocolError, StatsReport};
use serde_json::Value;
use std::io;

pub use bridge::{BridgeCompiler, BridgeDevServer, BridgeToolchain};

/// Compiler errors
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    #[error("failed to start compiler bridge `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("compiler failed: {0}")]
    Failed(String),

    #[error("bridge exited unexpectedly: {0}")]
    Disconnected(String),

    #[error("bridge protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("bridge I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A compiler instance built from one composed configuration.
pub trait Compiler {
    /// Run exactly one compile pass.
    ///
    /// `Err` means the compiler could not run at all; a pass that ran but
    /// found errors in the module graph comes back as `Ok` with errors in the
    /// report.
    fn run(&mut self) -> Result<StatsReport, CompilerError>;

    /// Release the compiler.
    fn close(&mut self) -> Result<(), CompilerError>;
}

/// Lifecycle callbacks a dev server fires for each compile.
pub trait CompilerHooks {
    /// A watched file changed and a new compile is starting.
    fn invalid(&mut self, file: Option<&str>);

    /// A compile pass completed.
    fn done(&mut self, stats: &StatsReport);
}

/// A watching, serving compiler.
pub trait DevServer {
    /// Start serving. Blocks for the life of the session and returns when
    /// the server stops. Start or compiler failures are `Err`.
    fn start(&mut self, hooks: &mut dyn CompilerHooks) -> Result<(), CompilerError>;
}

/// Factory for compilers and dev servers.
pub trait Toolchain {
    fn compiler(&self, config: &Value) -> Result<Box<dyn Compiler>, CompilerError>;

    fn dev_server(&self, config: &Value, options: &Value)
        -> Result<Box<dyn DevServer>, CompilerError>;
}
