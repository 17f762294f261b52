use crate::command::CompileCommand;
use crate::errors::{ProtowatchError, Result};
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured output of one compiler invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileResult {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code, `None` when terminated by a signal.
    /// Informational only; it plays no part in classification.
    pub exit_code: Option<i32>,
}

impl CompileResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(0),
        }
    }

    /// A compilation succeeded iff the compiler wrote nothing to stderr,
    /// whatever its exit code. Warnings on stderr count as failure.
    pub fn succeeded(&self) -> bool {
        self.stderr.is_empty()
    }
}

/// Runs a compiler invocation to completion
pub trait CompilerRunner: Send + Sync {
    fn run(&self, command: &CompileCommand) -> Result<CompileResult>;
}

/// Runs the compiler as a child process, blocking until it exits
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        ProcessRunner
    }
}

impl CompilerRunner for ProcessRunner {
    fn run(&self, command: &CompileCommand) -> Result<CompileResult> {
        debug!("Spawning {}", command);

        let output = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ProtowatchError::MissingExecutable {
                path: command.program().to_path_buf(),
                source,
            })?;

        Ok(CompileResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
