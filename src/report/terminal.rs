use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::build::{BuildOutcome, BuildResult, Diagnostic, Severity};
use crate::dev::DevNotice;
use crate::mode::Mode;

use super::style::{CHECK, CROSS, DOT, PACKAGE, RECYCLE, ROCKET, WARN};
use super::{asset_table, format_duration, Reporter};

const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Writes status lines, diagnostics and tables to the terminal.
#[derive(Default)]
pub struct ConsoleReporter {
    spinner: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn start_spinner(&mut self, message: String) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message);
        spinner.enable_steady_tick(SPINNER_TICK);
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn print_diagnostics(diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            let label = match diagnostic.severity {
                Severity::Warning => style("warning").yellow().bold(),
                Severity::Error => style("error").red().bold(),
            };
            match &diagnostic.module {
                Some(module) => println!("{label} in {}", style(module).cyan()),
                None => println!("{label}"),
            }
            println!("{}\n", diagnostic.message);
        }
    }
}

impl Reporter for ConsoleReporter {
    fn build_started(&mut self, mode: Mode) {
        self.start_spinner(format!("Building for {mode}..."));
    }

    fn build_aborted(&mut self) {
        self.stop_spinner();
        println!("{} {}", CROSS, style("Build aborted").red().bold());
    }

    fn build_finished(&mut self, result: &BuildResult) {
        self.stop_spinner();
        Self::print_diagnostics(&result.diagnostics);

        if !result.assets.is_empty() {
            println!("{} Emitted assets", PACKAGE);
            println!("{}", asset_table(result));
        }

        let elapsed = format_duration(result.elapsed);
        match result.outcome {
            BuildOutcome::Success => {
                println!("{} {} in {}", CHECK, style("Build complete").green().bold(), elapsed);
            }
            BuildOutcome::SuccessWithWarnings => {
                let count = result.warnings().count();
                println!(
                    "{} {} with {} warning(s) in {}",
                    WARN,
                    style("Build complete").yellow().bold(),
                    count,
                    elapsed
                );
            }
            BuildOutcome::Failure => {
                let count = result.errors().count();
                println!(
                    "{} {} with {} error(s)",
                    CROSS,
                    style("Build failed").red().bold(),
                    count
                );
            }
        }
    }

    fn dev_notice(&mut self, notice: &DevNotice) {
        match notice {
            DevNotice::PortSubstituted { requested, port } => {
                println!(
                    "{} Port {} is in use, using {} instead",
                    WARN,
                    style(requested).yellow(),
                    style(port).green().bold()
                );
            }
            DevNotice::Recompiling { file } => match file {
                Some(file) => println!("{} Recompiling after change to {}", RECYCLE, style(file).cyan()),
                None => println!("{} Recompiling...", RECYCLE),
            },
            DevNotice::Diagnostics(diagnostics) => Self::print_diagnostics(diagnostics),
            DevNotice::CompileFailed { errors, elapsed } => {
                println!(
                    "{} {} with {} error(s) in {}",
                    CROSS,
                    style("Compile failed").red().bold(),
                    errors,
                    format_duration(*elapsed)
                );
            }
            DevNotice::Ready {
                local,
                network,
                elapsed,
            } => {
                println!(
                    "{} {} in {}",
                    ROCKET,
                    style("Compiled successfully").green().bold(),
                    format_duration(*elapsed)
                );
                println!();
                println!("  App running at:");
                println!("  {} Local:   {}", DOT, style(local).cyan().underlined());
                if let Some(network) = network {
                    println!("  {} Network: {}", DOT, style(network).cyan().underlined());
                }
                println!();
            }
            DevNotice::Recompiled { elapsed } => {
                println!("{} Compiled in {}", CHECK, style(format_duration(*elapsed)).bold());
            }
            DevNotice::Stopped { compiles } => {
                println!("{} Dev server stopped after {} compile(s)", DOT, compiles);
            }
        }
    }
}
