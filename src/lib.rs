//! bean - build orchestrator for a webpack-style bundler
//!
//! Loads a project's `bean.toml`, composes a complete bundler configuration
//! from generated defaults, a mode profile and the project's own overrides,
//! then either runs one production build or keeps a dev server alive.
//! The bundler itself sits behind the [`compiler::Toolchain`] seam.

pub mod build;
pub mod commands;
pub mod compiler;
pub mod compose;
pub mod config;
pub mod dev;
pub mod error;
pub mod logging;
pub mod mock;
pub mod mode;
pub mod report;
pub mod signal;

pub use build::{build, BuildError, BuildOutcome, BuildResult};
pub use compose::{compose, compose_with, ComposeError, ComposeOptions};
pub use config::{ConfigError, ConfigLoader, ProjectConfig};
pub use dev::{serve, DevError, DevNotice, DevOptions, DevState};
pub use error::{BeanError, BeanResult};
pub use mode::Mode;
