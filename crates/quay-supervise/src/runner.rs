//! Command runner seam over external process control

use crate::{SuperviseError, SuperviseResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

/// Captured result of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status (-1 if terminated by signal)
    pub status: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited zero
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Abstraction over running external control commands (`systemctl`,
/// `launchctl`, `docker`). Every supervisor call goes through this
/// seam so strategies are testable without the real tools.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output
    async fn run(&self, program: &str, args: &[String]) -> SuperviseResult<CommandOutput>;

    /// Run a command and forward its stdout line by line into `tx`
    /// until EOF or until `stop` signals cancellation.
    ///
    /// Producers must never block on a slow consumer: lines that do not
    /// fit the bounded channel are dropped.
    async fn stream_lines(
        &self,
        program: &str,
        args: Vec<String>,
        tx: mpsc::Sender<String>,
        stop: watch::Receiver<bool>,
    ) -> SuperviseResult<()>;
}

/// Run a command and turn a non-zero exit into an error
pub(crate) async fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
) -> SuperviseResult<CommandOutput> {
    let output = runner.run(program, args).await?;
    if output.success() {
        Ok(output)
    } else {
        Err(SuperviseError::CommandFailed {
            program: program.to_string(),
            subcommand: args.first().cloned().unwrap_or_default(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Real runner backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecRunner;

impl ExecRunner {
    /// Create a runner
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ExecRunner {
    async fn run(&self, program: &str, args: &[String]) -> SuperviseResult<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| SuperviseError::Spawn {
                program: program.to_string(),
                source: e,
            })?;
        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn stream_lines(
        &self,
        program: &str,
        args: Vec<String>,
        tx: mpsc::Sender<String>,
        mut stop: watch::Receiver<bool>,
    ) -> SuperviseResult<()> {
        let mut child = tokio::process::Command::new(program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SuperviseError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SuperviseError::control("tail-logs", "child process has no stdout pipe")
        })?;
        let mut lines = BufReader::new(stdout).lines();

        loop {
            tokio::select! {
                _ = stop.changed() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        // Consumer lagging: drop rather than block.
                        let _ = tx.try_send(line);
                    }
                    Ok(None) | Err(_) => break,
                },
            }
        }

        let _ = child.kill().await;
        Ok(())
    }
}

#[derive(Default)]
struct MockRunnerState {
    calls: Vec<(String, Vec<String>)>,
    failures: HashMap<(String, String), String>,
    stream_lines: Vec<String>,
}

/// Recording runner for tests: canned outputs, injectable failures per
/// (program, subcommand) pair, canned log lines.
#[derive(Default)]
pub struct MockRunner {
    state: Mutex<MockRunnerState>,
}

impl MockRunner {
    /// Create an empty mock runner where every command succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program subcommand` exit non-zero with the given stderr
    pub fn fail_on(&self, program: &str, subcommand: &str, stderr: &str) {
        self.state.lock().failures.insert(
            (program.to_string(), subcommand.to_string()),
            stderr.to_string(),
        );
    }

    /// Lines returned by `stream_lines`
    pub fn set_stream_lines(&self, lines: Vec<String>) {
        self.state.lock().stream_lines = lines;
    }

    /// Every command issued so far, in order
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().calls.clone()
    }

    /// Commands issued, flattened to "program arg0 arg1 ..." strings
    pub fn call_lines(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(program, args)| {
                let mut line = program;
                for arg in args {
                    line.push(' ');
                    line.push_str(&arg);
                }
                line
            })
            .collect()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, program: &str, args: &[String]) -> SuperviseResult<CommandOutput> {
        let mut state = self.state.lock();
        state.calls.push((program.to_string(), args.to_vec()));
        let subcommand = args.first().cloned().unwrap_or_default();
        if let Some(stderr) = state.failures.get(&(program.to_string(), subcommand)) {
            return Ok(CommandOutput {
                status: 1,
                stdout: String::new(),
                stderr: stderr.clone(),
            });
        }
        Ok(CommandOutput {
            status: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    async fn stream_lines(
        &self,
        program: &str,
        args: Vec<String>,
        tx: mpsc::Sender<String>,
        _stop: watch::Receiver<bool>,
    ) -> SuperviseResult<()> {
        let lines = {
            let mut state = self.state.lock();
            state.calls.push((program.to_string(), args));
            state.stream_lines.clone()
        };
        for line in lines {
            let _ = tx.try_send(line);
        }
        Ok(())
    }
}
