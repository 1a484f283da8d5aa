//! Mock Toolchain Implementation
//!
//! Scripted, in-process stand-in for the bundler. Clones share state, so a
//! test can hand the toolchain to an orchestrator and inspect it afterwards.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use bean_protocol::StatsReport;
use serde_json::Value;

use super::failure::{FailureInjector, MockOperation};
use crate::compiler::{Compiler, CompilerError, CompilerHooks, DevServer, Toolchain};

/// One step of a scripted dev session.
#[derive(Debug, Clone, PartialEq)]
pub enum DevEvent {
    Invalid(Option<String>),
    Done(StatsReport),
}

#[derive(Debug, Default)]
struct MockState {
    runs: VecDeque<StatsReport>,
    dev_events: Vec<DevEvent>,
    compilers_created: u32,
    servers_created: u32,
    run_count: u32,
    close_count: u32,
    last_config: Option<Value>,
    last_server_options: Option<Value>,
}

/// In-process toolchain for tests.
#[derive(Debug, Clone, Default)]
pub struct MockToolchain {
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<FailureInjector>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the report returned by the next `run`. With nothing queued,
    /// `run` returns an empty (clean) report.
    pub fn with_stats(self, stats: StatsReport) -> Self {
        lock(&self.state).runs.push_back(stats);
        self
    }

    /// Events a dev server replays when started.
    pub fn with_dev_events(self, events: Vec<DevEvent>) -> Self {
        lock(&self.state).dev_events = events;
        self
    }

    /// Make `op` fail with `message`.
    pub fn failing(self, op: MockOperation, message: impl Into<String>) -> Self {
        lock(&self.failures).inject_error(op, message);
        self
    }

    pub fn failures(&self) -> MutexGuard<'_, FailureInjector> {
        lock(&self.failures)
    }

    pub fn compilers_created(&self) -> u32 {
        lock(&self.state).compilers_created
    }

    pub fn servers_created(&self) -> u32 {
        lock(&self.state).servers_created
    }

    pub fn run_count(&self) -> u32 {
        lock(&self.state).run_count
    }

    pub fn close_count(&self) -> u32 {
        lock(&self.state).close_count
    }

    /// Configuration passed to the most recent compiler or server.
    pub fn last_config(&self) -> Option<Value> {
        lock(&self.state).last_config.clone()
    }

    pub fn last_server_options(&self) -> Option<Value> {
        lock(&self.state).last_server_options.clone()
    }

    fn check(&self, op: MockOperation) -> Result<(), CompilerError> {
        match lock(&self.failures).check(op) {
            Some(message) => Err(CompilerError::Failed(message)),
            None => Ok(()),
        }
    }
}

impl Toolchain for MockToolchain {
    fn compiler(&self, config: &Value) -> Result<Box<dyn Compiler>, CompilerError> {
        self.check(MockOperation::CreateCompiler)?;
        let mut state = lock(&self.state);
        state.compilers_created += 1;
        state.last_config = Some(config.clone());
        Ok(Box::new(MockCompiler {
            toolchain: self.clone(),
        }))
    }

    fn dev_server(
        &self,
        config: &Value,
        options: &Value,
    ) -> Result<Box<dyn DevServer>, CompilerError> {
        self.check(MockOperation::CreateServer)?;
        let mut state = lock(&self.state);
        state.servers_created += 1;
        state.last_config = Some(config.clone());
        state.last_server_options = Some(options.clone());
        Ok(Box::new(MockDevServer {
            toolchain: self.clone(),
        }))
    }
}

struct MockCompiler {
    toolchain: MockToolchain,
}

impl Compiler for MockCompiler {
    fn run(&mut self) -> Result<StatsReport, CompilerError> {
        lock(&self.toolchain.state).run_count += 1;
        self.toolchain.check(MockOperation::Run)?;
        Ok(lock(&self.toolchain.state)
            .runs
            .pop_front()
            .unwrap_or_default())
    }

    fn close(&mut self) -> Result<(), CompilerError> {
        lock(&self.toolchain.state).close_count += 1;
        self.toolchain.check(MockOperation::Close)
    }
}

struct MockDevServer {
    toolchain: MockToolchain,
}

impl DevServer for MockDevServer {
    fn start(&mut self, hooks: &mut dyn CompilerHooks) -> Result<(), CompilerError> {
        self.toolchain.check(MockOperation::StartServer)?;
        let events = lock(&self.toolchain.state).dev_events.clone();
        for event in &events {
            match event {
                DevEvent::Invalid(file) => hooks.invalid(file.as_deref()),
                DevEvent::Done(stats) => hooks.done(stats),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bean_protocol::StatsDiagnostic;
    use serde_json::json;

    #[test]
    fn test_scripted_runs_in_order() {
        let mut failing = StatsReport::default();
        failing.errors.push(StatsDiagnostic::new("boom"));
        let toolchain = MockToolchain::new()
            .with_stats(StatsReport::default())
            .with_stats(failing);

        let mut compiler = toolchain.compiler(&json!({"mode": "production"})).unwrap();
        assert!(!compiler.run().unwrap().has_errors());
        assert!(compiler.run().unwrap().has_errors());
        // Script exhausted: clean report.
        assert!(!compiler.run().unwrap().has_errors());

        compiler.close().unwrap();
        assert_eq!(toolchain.run_count(), 3);
        assert_eq!(toolchain.close_count(), 1);
        assert_eq!(toolchain.last_config().unwrap()["mode"], "production");
    }

    #[test]
    fn test_injected_failures() {
        let toolchain = MockToolchain::new()
            .failing(MockOperation::Run, "compiler crashed")
            .failing(MockOperation::Close, "close failed");

        let mut compiler = toolchain.compiler(&json!({})).unwrap();
        assert!(compiler.run().is_err());
        assert!(compiler.close().is_err());
        assert_eq!(toolchain.close_count(), 1);
    }

    #[test]
    fn test_create_failure_counts_nothing() {
        let toolchain = MockToolchain::new().failing(MockOperation::CreateCompiler, "no bundler");
        assert!(toolchain.compiler(&json!({})).is_err());
        assert_eq!(toolchain.compilers_created(), 0);
    }

    #[derive(Default)]
    struct Count {
        invalid: u32,
        done: u32,
    }

    impl CompilerHooks for Count {
        fn invalid(&mut self, _file: Option<&str>) {
            self.invalid += 1;
        }

        fn done(&mut self, _stats: &StatsReport) {
            self.done += 1;
        }
    }

    #[test]
    fn test_dev_server_replays_events() {
        let toolchain = MockToolchain::new().with_dev_events(vec![
            DevEvent::Done(StatsReport::default()),
            DevEvent::Invalid(Some("src/a.js".to_string())),
            DevEvent::Done(StatsReport::default()),
        ]);

        let mut server = toolchain
            .dev_server(&json!({}), &json!({"port": 8800}))
            .unwrap();
        let mut hooks = Count::default();
        server.start(&mut hooks).unwrap();

        assert_eq!(hooks.invalid, 1);
        assert_eq!(hooks.done, 2);
        assert_eq!(toolchain.last_server_options().unwrap()["port"], 8800);
    }
}
