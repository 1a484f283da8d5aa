//! Build orchestrator
//!
//! Creates a compiler from the composed configuration, runs one pass,
//! closes the compiler whatever happened, then classifies and reports the
//! result.

mod result;

use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::compiler::{CompilerError, Toolchain};
use crate::mode::Mode;
use crate::report::Reporter;

pub use result::{collect_assets, diagnostics, AssetRow, BuildOutcome, BuildResult, Diagnostic, Severity};

/// Build errors
#[derive(Debug, Error)]
pub enum BuildError {
    /// The compiler could not be created or could not run.
    #[error(transparent)]
    Compiler(#[from] CompilerError),

    /// The pass ran but the module graph has errors.
    #[error("build failed with {errors} error(s)")]
    Failed {
        errors: usize,
        result: Box<BuildResult>,
    },
}

/// Run one production (or development) build of `config`.
pub fn build(
    config: &Value,
    mode: Mode,
    toolchain: &dyn Toolchain,
    reporter: &mut dyn Reporter,
) -> Result<BuildResult, BuildError> {
    reporter.build_started(mode);
    let started = Instant::now();

    let mut compiler = match toolchain.compiler(config) {
        Ok(compiler) => compiler,
        Err(e) => {
            reporter.build_aborted();
            return Err(e.into());
        }
    };

    let run = compiler.run();
    if let Err(e) = compiler.close() {
        warn!(error = %e, "failed to close compiler");
    }

    let stats = match run {
        Ok(stats) => stats,
        Err(e) => {
            reporter.build_aborted();
            return Err(e.into());
        }
    };

    let result = BuildResult::from_stats(&stats, started.elapsed());
    debug!(
        outcome = ?result.outcome,
        assets = result.assets.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "compile pass finished"
    );
    reporter.build_finished(&result);

    match result.outcome {
        BuildOutcome::Failure => Err(BuildError::Failed {
            errors: result.errors().count(),
            result: Box::new(result),
        }),
        _ => {
            info!(elapsed_ms = result.elapsed.as_millis() as u64, "build complete");
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockOperation, MockToolchain, RecordingReporter, ReportEvent};
    use bean_protocol::{StatsDiagnostic, StatsReport};
    use serde_json::json;

    #[test]
    fn test_clean_build_closes_once() {
        let toolchain = MockToolchain::new().with_stats(StatsReport::default());
        let mut reporter = RecordingReporter::default();

        let result = build(&json!({}), Mode::Production, &toolchain, &mut reporter).unwrap();
        assert_eq!(result.outcome, BuildOutcome::Success);
        assert_eq!(toolchain.run_count(), 1);
        assert_eq!(toolchain.close_count(), 1);
        assert!(matches!(
            reporter.events.as_slice(),
            [ReportEvent::BuildStarted(Mode::Production), ReportEvent::BuildFinished(_)]
        ));
    }

    #[test]
    fn test_compile_errors_reported_before_rejecting() {
        let mut stats = StatsReport::default();
        stats.errors.push(StatsDiagnostic::new("Module not found"));
        let toolchain = MockToolchain::new().with_stats(stats);
        let mut reporter = RecordingReporter::default();

        let err = build(&json!({}), Mode::Production, &toolchain, &mut reporter).unwrap_err();
        match err {
            BuildError::Failed { errors, result } => {
                assert_eq!(errors, 1);
                assert_eq!(result.outcome, BuildOutcome::Failure);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(toolchain.close_count(), 1);
        assert!(matches!(reporter.events.last(), Some(ReportEvent::BuildFinished(_))));
    }

    #[test]
    fn test_run_failure_still_closes() {
        let toolchain = MockToolchain::new().failing(MockOperation::Run, "internal error");
        let mut reporter = RecordingReporter::default();

        let err = build(&json!({}), Mode::Production, &toolchain, &mut reporter).unwrap_err();
        assert!(matches!(err, BuildError::Compiler(CompilerError::Failed(_))));
        assert_eq!(toolchain.close_count(), 1);
        assert!(matches!(reporter.events.last(), Some(ReportEvent::BuildAborted)));
    }

    #[test]
    fn test_close_failure_does_not_mask_outcome() {
        let toolchain = MockToolchain::new()
            .with_stats(StatsReport::default())
            .failing(MockOperation::Close, "EBUSY");
        let mut reporter = RecordingReporter::default();

        let result = build(&json!({}), Mode::Production, &toolchain, &mut reporter).unwrap();
        assert_eq!(result.outcome, BuildOutcome::Success);
        assert_eq!(toolchain.close_count(), 1);
    }

    #[test]
    fn test_compiler_creation_failure() {
        let toolchain = MockToolchain::new().failing(MockOperation::CreateCompiler, "no bundler");
        let mut reporter = RecordingReporter::default();

        let err = build(&json!({}), Mode::Production, &toolchain, &mut reporter).unwrap_err();
        assert!(matches!(err, BuildError::Compiler(_)));
        assert_eq!(toolchain.run_count(), 0);
        assert_eq!(toolchain.close_count(), 0);
    }
}
