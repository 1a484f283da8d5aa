//! Mock Toolchain
//!
//! In-process implementation of the compiler seam for tests:
//! - scripted stats reports for `run`
//! - scripted invalidation/done sequences for dev servers
//! - failure injection for every operation
//! - counters for compilers created, runs and closes
//! - a reporter that records what the orchestrators said

mod failure;
mod reporter;
mod toolchain;

pub use failure::{FailureConfig, FailureInjector, MockOperation};
pub use reporter::{RecordingReporter, ReportEvent};
pub use toolchain::{DevEvent, MockToolchain};
