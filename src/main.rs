//! bean CLI
//!
//! Entry point for the `bean` command-line tool.

use bean_cli::commands::{
    bridge_toolchain, run_build, run_dev, run_inspect, BuildRequest, DevRequest, ProjectSource,
};
use bean_cli::config::defaults::BRIDGE_ENV;
use bean_cli::dev::TcpProbe;
use bean_cli::logging::{init_logging, LogConfig, LogFormat};
use bean_cli::report::ConsoleReporter;
use bean_cli::signal::SignalHandler;
use bean_cli::{BeanResult, Mode};
use clap::{ArgAction, Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process;
use tracing::warn;

#[derive(Parser)]
#[command(name = "bean")]
#[command(about = "Build and serve web projects with a webpack-style bundler", version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project once
    Build {
        /// development or production
        #[arg(long, default_value = "production")]
        mode: Mode,

        /// Path to project config file (default: bean.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Add the bundle analyzer
        #[arg(long)]
        analyze: bool,

        /// Write the composed configuration to bean.config.debug.json
        #[arg(long)]
        debug: bool,
    },

    /// Start the dev server
    Dev {
        /// development or production
        #[arg(long, default_value = "development")]
        mode: Mode,

        /// Path to project config file (default: bean.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Preferred port; the next free one is used if it is taken
        #[arg(long, short = 'p')]
        port: Option<u16>,

        /// Open a browser once the server is up
        #[arg(long, short = 'o')]
        open: bool,

        /// Write the composed configuration to bean.config.debug.json
        #[arg(long)]
        debug: bool,
    },

    /// Print the composed configuration as JSON
    Inspect {
        /// development or production
        #[arg(long, default_value = "development")]
        mode: Mode,

        /// Path to project config file (default: bean.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose)
        .with_format(cli.log_format)
        .with_log_file(cli.log_file.clone());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{} cannot open log file: {}", style("error:").red().bold(), e);
        process::exit(1);
    }

    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        process::exit(e.exit_code());
    }
}

fn source(config: Option<PathBuf>) -> BeanResult<ProjectSource> {
    Ok(ProjectSource {
        root: std::env::current_dir()?,
        config,
        bridge: std::env::var(BRIDGE_ENV).ok(),
    })
}

fn run(command: Commands) -> BeanResult<()> {
    match command {
        Commands::Build {
            mode,
            config,
            analyze,
            debug,
        } => {
            let project = source(config)?.load()?;
            let toolchain = bridge_toolchain(&project);
            let mut reporter = ConsoleReporter::new();
            let request = BuildRequest {
                mode,
                analyze,
                debug,
            };
            run_build(&project, &request, &toolchain, &mut reporter)?;
        }

        Commands::Dev {
            mode,
            config,
            port,
            open,
            debug,
        } => {
            let project = source(config)?.load()?;
            let toolchain = bridge_toolchain(&project);
            let mut reporter = ConsoleReporter::new();

            let signals = SignalHandler::new();
            if let Err(e) = signals.install() {
                warn!(error = %e, "failed to install Ctrl+C handler");
            }
            let state = signals.state();

            let request = DevRequest {
                mode,
                port,
                open,
                debug,
            };
            run_dev(
                &project,
                &request,
                &toolchain,
                &TcpProbe,
                &mut reporter,
                Some(state.as_ref()),
            )?;
        }

        Commands::Inspect { mode, config } => {
            let project = source(config)?.load()?;
            println!("{}", run_inspect(&project, mode)?);
        }
    }
    Ok(())
}
