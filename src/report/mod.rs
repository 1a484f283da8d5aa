//! Console reporting.
//!
//! Orchestrators talk to a [`Reporter`]; the console implementation owns
//! all styling, the spinner and the asset table.

mod terminal;
pub mod style;
mod table;

use std::time::Duration;

use crate::build::BuildResult;
use crate::dev::DevNotice;
use crate::mode::Mode;

pub use terminal::ConsoleReporter;
pub use table::{asset_table, apply_table_style};

/// Receives progress from the build and dev orchestrators.
pub trait Reporter {
    fn build_started(&mut self, mode: Mode);
    /// The compiler could not be created or could not run.
    fn build_aborted(&mut self);
    fn build_finished(&mut self, result: &BuildResult);
    fn dev_notice(&mut self, notice: &DevNotice);
}

const SIZE_UNITS: &[&str] = &["KiB", "MiB", "GiB"];

/// Human-readable byte size: `512 B`, `1.50 KiB`, `3.20 MiB`.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = SIZE_UNITS[0];
    for next in &SIZE_UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.2} {unit}")
}

/// `850ms` below a second, `2.35s` above.
pub fn format_duration(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        return format!("{ms}ms");
    }
    // Round to hundredths from integer milliseconds.
    let centis = (ms + 5) / 10;
    format!("{}.{:02}s", centis / 100, centis % 100)
}
