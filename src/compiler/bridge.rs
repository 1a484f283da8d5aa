//! Process-backed toolchain.
//!
//! Spawns the bridge command in the project root and exchanges
//! `bean-protocol` JSON lines over its stdin/stdout. The bridge's stderr is
//! inherited so bundler output reaches the terminal unchanged.

use bean_protocol::{BridgeEvent, BridgeMessage, HostCommand, HostMessage, StatsReport};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, trace, warn};

use super::{Compiler, CompilerError, CompilerHooks, DevServer, Toolchain};

/// Toolchain that talks to an external bridge process.
#[derive(Debug, Clone)]
pub struct BridgeToolchain {
    command: Vec<String>,
    cwd: PathBuf,
}

impl BridgeToolchain {
    /// `command` is the program followed by its arguments.
    pub fn new(command: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command,
            cwd: cwd.into(),
        }
    }

    fn spawn(&self) -> Result<BridgeProcess, CompilerError> {
        BridgeProcess::spawn(&self.command, &self.cwd)
    }
}

impl Toolchain for BridgeToolchain {
    fn compiler(&self, config: &Value) -> Result<Box<dyn Compiler>, CompilerError> {
        Ok(Box::new(BridgeCompiler {
            process: Some(self.spawn()?),
            config: config.clone(),
        }))
    }

    fn dev_server(
        &self,
        config: &Value,
        options: &Value,
    ) -> Result<Box<dyn DevServer>, CompilerError> {
        Ok(Box::new(BridgeDevServer {
            process: self.spawn()?,
            config: config.clone(),
            options: options.clone(),
        }))
    }
}

struct BridgeProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    command_line: String,
}

impl BridgeProcess {
    fn spawn(command: &[String], cwd: &Path) -> Result<Self, CompilerError> {
        let command_line = command.join(" ");
        let (program, args) = command.split_first().ok_or_else(|| CompilerError::Spawn {
            command: command_line.clone(),
            message: "empty command".to_string(),
        })?;

        debug!(command = %command_line, cwd = %cwd.display(), "spawning compiler bridge");
        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| CompilerError::Spawn {
                command: command_line.clone(),
                message: e.to_string(),
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| CompilerError::Spawn {
            command: command_line.clone(),
            message: "stdout not captured".to_string(),
        })?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            command_line,
        })
    }

    fn send(&mut self, command: HostCommand) -> Result<(), CompilerError> {
        let line = HostMessage::new(command).to_line()?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| CompilerError::Disconnected("bridge stdin is closed".to_string()))?;
        writeln!(stdin, "{}", line)?;
        stdin.flush()?;
        Ok(())
    }

    /// Next event, or `None` once the bridge closes its stdout.
    fn next_event(&mut self) -> Result<Option<BridgeEvent>, CompilerError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if line.trim().is_empty() {
                continue;
            }
            trace!(line = line.trim_end(), "bridge event");
            return Ok(Some(BridgeMessage::from_line(&line)?.event));
        }
    }

    fn exit_description(&mut self) -> String {
        match self.child.wait() {
            Ok(status) => format!("`{}` exited with {}", self.command_line, status),
            Err(e) => format!("`{}`: {}", self.command_line, e),
        }
    }

    /// Reap a bridge whose stdout has closed. A failure status means the
    /// bridge died rather than stopped.
    fn stopped(&mut self) -> Result<(), CompilerError> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        if !status.success() {
            return Err(CompilerError::Disconnected(format!(
                "`{}` exited with {}",
                self.command_line, status
            )));
        }
        debug!(command = %self.command_line, %status, "bridge stopped serving");
        Ok(())
    }

    /// Close stdin and reap the child.
    fn finish(mut self) -> Result<(), CompilerError> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        if !status.success() {
            warn!(command = %self.command_line, %status, "bridge exited with failure status");
        }
        Ok(())
    }
}

impl Drop for BridgeProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Compiler backed by a bridge process.
pub struct BridgeCompiler {
    process: Option<BridgeProcess>,
    config: Value,
}

impl Compiler for BridgeCompiler {
    fn run(&mut self) -> Result<StatsReport, CompilerError> {
        let process = self
            .process
            .as_mut()
            .ok_or_else(|| CompilerError::Disconnected("compiler already closed".to_string()))?;

        process.send(HostCommand::Run {
            config: self.config.clone(),
        })?;

        loop {
            match process.next_event()? {
                Some(BridgeEvent::Done { stats }) => return Ok(stats),
                Some(BridgeEvent::Failed { message }) => return Err(CompilerError::Failed(message)),
                Some(BridgeEvent::Invalid { .. }) => continue,
                Some(BridgeEvent::Closed) | None => {
                    return Err(CompilerError::Disconnected(process.exit_description()))
                }
            }
        }
    }

    fn close(&mut self) -> Result<(), CompilerError> {
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };

        process.send(HostCommand::Close)?;
        loop {
            match process.next_event()? {
                Some(BridgeEvent::Closed) | None => break,
                Some(BridgeEvent::Failed { message }) => return Err(CompilerError::Failed(message)),
                Some(other) => debug!(?other, "ignoring event while closing"),
            }
        }
        process.finish()
    }
}

/// Dev server backed by a bridge process.
pub struct BridgeDevServer {
    process: BridgeProcess,
    config: Value,
    options: Value,
}

impl DevServer for BridgeDevServer {
    fn start(&mut self, hooks: &mut dyn CompilerHooks) -> Result<(), CompilerError> {
        self.process.send(HostCommand::Serve {
            config: self.config.clone(),
            server: self.options.clone(),
        })?;

        loop {
            match self.process.next_event()? {
                Some(BridgeEvent::Invalid { file }) => hooks.invalid(file.as_deref()),
                Some(BridgeEvent::Done { stats }) => hooks.done(&stats),
                Some(BridgeEvent::Failed { message }) => return Err(CompilerError::Failed(message)),
                Some(BridgeEvent::Closed) => return Ok(()),
                None => return self.process.stopped(),
            }
        }
    }
}
