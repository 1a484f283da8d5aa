//! Top-level error and exit codes.

use std::io;
use thiserror::Error;

use crate::build::BuildError;
use crate::compose::ComposeError;
use crate::config::ConfigError;
use crate::dev::DevError;

/// Exit code for configuration and composition errors
pub const EXIT_CONFIG: i32 = 1;
/// Exit code when the compiler cannot start or run
pub const EXIT_COMPILER: i32 = 2;
/// Exit code when a compile pass reported errors
pub const EXIT_COMPILE_FAILED: i32 = 3;
/// Exit code for host and port problems
pub const EXIT_NETWORK: i32 = 4;

#[derive(Debug, Error)]
pub enum BeanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Dev(#[from] DevError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BeanError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BeanError::Config(_) | BeanError::Compose(_) | BeanError::Io(_) => EXIT_CONFIG,
            BeanError::Build(BuildError::Compiler(_)) => EXIT_COMPILER,
            BeanError::Build(BuildError::Failed { .. }) => EXIT_COMPILE_FAILED,
            BeanError::Dev(e) if e.is_network() => EXIT_NETWORK,
            BeanError::Dev(_) => EXIT_COMPILER,
        }
    }
}

pub type BeanResult<T> = Result<T, BeanError>;
