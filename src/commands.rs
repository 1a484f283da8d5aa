//! Command flows shared by the binary and the integration tests.
//!
//! Each flow takes an already loaded [`ProjectConfig`] and the collaborators
//! it needs, so tests can swap in the mock toolchain and a recording
//! reporter.

use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::build::{self, BuildResult};
use crate::compiler::{BridgeToolchain, Toolchain};
use crate::compose::{compose_with, ComposeOptions, DebugArtifact};
use crate::config::{ConfigLoader, ProjectConfig};
use crate::dev::{self, DevOptions, DevSummary, PortProbe};
use crate::error::BeanResult;
use crate::mode::Mode;
use crate::report::Reporter;
use crate::signal::SignalState;

/// Where to find the project and how to reach the bundler.
#[derive(Debug, Clone, Default)]
pub struct ProjectSource {
    pub root: PathBuf,
    /// `--config`; must exist when given.
    pub config: Option<PathBuf>,
    /// Whitespace-separated bridge command from the environment.
    pub bridge: Option<String>,
}

impl ProjectSource {
    pub fn load(&self) -> BeanResult<ProjectConfig> {
        let project = ConfigLoader::new(&self.root)
            .with_config_path(self.config.clone())
            .with_bridge_override(self.bridge.clone())
            .load()?;
        Ok(project)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildRequest {
    pub mode: Mode,
    pub analyze: bool,
    pub debug: bool,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            mode: Mode::Production,
            analyze: false,
            debug: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DevRequest {
    pub mode: Mode,
    pub port: Option<u16>,
    pub open: bool,
    pub debug: bool,
}

impl Default for DevRequest {
    fn default() -> Self {
        Self {
            mode: Mode::Development,
            port: None,
            open: false,
            debug: false,
        }
    }
}

/// The toolchain described by the project's `[bridge]` section.
pub fn bridge_toolchain(project: &ProjectConfig) -> BridgeToolchain {
    BridgeToolchain::new(project.bridge.command.clone(), &project.root)
}

/// Compose for `mode` and, when asked, drop the debug artifact next to the
/// project. A failed artifact write is only logged.
pub fn prepare(
    project: &ProjectConfig,
    mode: Mode,
    options: ComposeOptions,
    debug: bool,
) -> BeanResult<Value> {
    let config = compose_with(project, mode, options)?;
    if debug {
        match DebugArtifact::new(project, mode, &config).write(project) {
            Ok(path) => info!(path = %path.display(), "wrote composed configuration"),
            Err(e) => warn!(error = %e, "could not write debug artifact"),
        }
    }
    Ok(config)
}

pub fn run_build(
    project: &ProjectConfig,
    request: &BuildRequest,
    toolchain: &dyn Toolchain,
    reporter: &mut dyn Reporter,
) -> BeanResult<BuildResult> {
    let config = prepare(
        project,
        request.mode,
        ComposeOptions {
            analyze: request.analyze,
        },
        request.debug,
    )?;
    Ok(build::build(&config, request.mode, toolchain, reporter)?)
}

/// Run a dev session.
///
/// Returns `Ok(None)` when the server went down after Ctrl+C, whatever the
/// bridge said on the way out.
pub fn run_dev(
    project: &ProjectConfig,
    request: &DevRequest,
    toolchain: &dyn Toolchain,
    probe: &dyn PortProbe,
    reporter: &mut dyn Reporter,
    signals: Option<&SignalState>,
) -> BeanResult<Option<DevSummary>> {
    let config = prepare(project, request.mode, ComposeOptions::default(), request.debug)?;
    let options = DevOptions {
        port: request.port,
        open: request.open,
    };

    match dev::serve(project, &config, &options, toolchain, probe, reporter) {
        Ok(summary) => Ok(Some(summary)),
        Err(e) if signals.is_some_and(SignalState::is_stop_requested) && !e.is_network() => {
            info!(error = %e, "dev server ended after interrupt");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// The composed tree as pretty JSON.
pub fn run_inspect(project: &ProjectConfig, mode: Mode) -> BeanResult<String> {
    let config = compose_with(project, mode, ComposeOptions::default())?;
    Ok(serde_json::to_string_pretty(&config).map_err(crate::compose::ComposeError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::DEBUG_FILE_NAME;
    use crate::dev::DevError;
    use crate::mock::{MockOperation, MockToolchain, RecordingReporter};
    use tempfile::TempDir;

    struct AlwaysFree;

    impl PortProbe for AlwaysFree {
        fn is_free(&self, _host: &str, _port: u16) -> Result<bool, DevError> {
            Ok(true)
        }
    }

    #[test]
    fn test_build_writes_debug_artifact() {
        let dir = TempDir::new().unwrap();
        let project = ProjectConfig::with_defaults(dir.path());
        let toolchain = MockToolchain::new();
        let mut reporter = RecordingReporter::default();

        let request = BuildRequest {
            debug: true,
            ..Default::default()
        };
        run_build(&project, &request, &toolchain, &mut reporter).unwrap();

        assert!(dir.path().join(DEBUG_FILE_NAME).exists());
        assert_eq!(toolchain.last_config().unwrap()["mode"], "production");
    }

    #[test]
    fn test_analyze_flag_adds_analyzer() {
        let project = ProjectConfig::with_defaults("/work/app");
        let toolchain = MockToolchain::new();
        let mut reporter = RecordingReporter::default();

        let request = BuildRequest {
            analyze: true,
            ..Default::default()
        };
        run_build(&project, &request, &toolchain, &mut reporter).unwrap();

        let config = toolchain.last_config().unwrap();
        let plugins: Vec<_> = config["plugins"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["plugin"].as_str())
            .collect();
        assert!(plugins.contains(&crate::compose::plugin::BUNDLE_ANALYZER));
    }

    #[test]
    fn test_interrupted_dev_is_not_an_error() {
        let project = ProjectConfig::with_defaults("/work/app");
        let toolchain = MockToolchain::new().failing(MockOperation::StartServer, "bridge exited");
        let mut reporter = RecordingReporter::default();
        let signals = SignalState::new();
        signals.handle_signal();

        let outcome = run_dev(
            &project,
            &DevRequest::default(),
            &toolchain,
            &AlwaysFree,
            &mut reporter,
            Some(&signals),
        )
        .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_dev_failure_without_interrupt() {
        let project = ProjectConfig::with_defaults("/work/app");
        let toolchain = MockToolchain::new().failing(MockOperation::StartServer, "bridge exited");
        let mut reporter = RecordingReporter::default();

        let err = run_dev(
            &project,
            &DevRequest::default(),
            &toolchain,
            &AlwaysFree,
            &mut reporter,
            None,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_dev_uses_development_mode() {
        let project = ProjectConfig::with_defaults("/work/app");
        let toolchain = MockToolchain::new();
        let mut reporter = RecordingReporter::default();

        run_dev(
            &project,
            &DevRequest::default(),
            &toolchain,
            &AlwaysFree,
            &mut reporter,
            None,
        )
        .unwrap();
        assert_eq!(toolchain.last_config().unwrap()["mode"], "development");
    }

    #[test]
    fn test_inspect_prints_tree() {
        let project = ProjectConfig::with_defaults("/work/app");
        let json = run_inspect(&project, Mode::Development).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["mode"], "development");
    }
}
