//! Executor capability for running external tools.
//!
//! The [`Executor`] trait decouples the Git façade and the steps from actual
//! subprocesses. Tests use a scripted executor that answers from canned
//! replies without spawning anything.

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::io::cancel::CancelToken;
use crate::io::process::{Finished, run_captured, run_inherited};

/// Upper bound on the stderr excerpt attached to failure events.
const STDERR_SNIPPET_BYTES: usize = 512;

/// Buffered output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Failure running an external command.
///
/// `Exit` carries the numeric exit code so callers can translate codes
/// with semantic meaning (e.g. `git diff --quiet` exiting 1).
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start '{command}' in dir '{dir}': {source}")]
    Spawn {
        command: String,
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{command}' in dir '{dir}' failed with exit {code}. Stderr: {stderr}")]
    Exit {
        command: String,
        dir: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("command '{command}' in dir '{dir}' was terminated by a signal")]
    Signaled { command: String, dir: String },

    #[error("command '{command}' was canceled")]
    Canceled { command: String },
}

impl ExecError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Captured stderr, empty when the command never ran or streamed its output.
    pub fn stderr(&self) -> &str {
        match self {
            Self::Exit { stderr, .. } => stderr,
            _ => "",
        }
    }
}

/// Find the exit code of a failed command anywhere in an error chain.
pub fn exit_code_of(err: &anyhow::Error) -> Option<i32> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ExecError>())
        .and_then(ExecError::exit_code)
}

/// Abstraction over running external commands.
pub trait Executor {
    /// Run with the parent's stdio attached. Non-zero exit is an error.
    fn execute(
        &self,
        cancel: &CancelToken,
        workdir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<(), ExecError>;

    /// Run and buffer stdout/stderr. Non-zero exit is an error.
    fn capture_output(
        &self,
        cancel: &CancelToken,
        workdir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<CommandOutput, ExecError>;

    /// True iff `program` resolves on `PATH`.
    fn command_exists(&self, program: &str) -> bool;
}

/// Executor backed by real operating-system processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsExecutor;

impl Executor for OsExecutor {
    #[instrument(skip_all, fields(program = %program, dir = %workdir.display()))]
    fn execute(
        &self,
        cancel: &CancelToken,
        workdir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<(), ExecError> {
        let command = render_command(program, args);
        let dir = workdir.display().to_string();
        debug!(command = %command, "executing (streamed)");

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(workdir);
        let finished = run_inherited(cmd, cancel).map_err(|source| {
            error!(command = %command, err = %source, "failed to start command");
            ExecError::Spawn {
                command: command.clone(),
                dir: dir.clone(),
                source,
            }
        })?;

        check_finished(finished, command, dir, String::new(), String::new())
    }

    #[instrument(skip_all, fields(program = %program, dir = %workdir.display()))]
    fn capture_output(
        &self,
        cancel: &CancelToken,
        workdir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<CommandOutput, ExecError> {
        let command = render_command(program, args);
        let dir = workdir.display().to_string();
        debug!(command = %command, "executing (captured)");

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(workdir);
        let output = run_captured(cmd, cancel).map_err(|source| {
            error!(command = %command, err = %source, "failed to start command");
            ExecError::Spawn {
                command: command.clone(),
                dir: dir.clone(),
                source,
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        check_finished(output.finished, command, dir, stdout.clone(), stderr.clone())?;
        Ok(CommandOutput { stdout, stderr })
    }

    fn command_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

fn check_finished(
    finished: Finished,
    command: String,
    dir: String,
    stdout: String,
    stderr: String,
) -> Result<(), ExecError> {
    let status = match finished {
        Finished::Exited(status) => status,
        Finished::Canceled => {
            error!(command = %command, "command canceled");
            return Err(ExecError::Canceled { command });
        }
    };
    if status.success() {
        debug!(command = %command, "command succeeded");
        return Ok(());
    }
    match status.code() {
        Some(code) => {
            // Callers decide whether a given exit is a failure; several git
            // checks answer with exit 1.
            debug!(
                command = %command,
                exit_code = code,
                stderr = %snippet(&stderr),
                "command exited non-zero"
            );
            Err(ExecError::Exit {
                command,
                dir,
                code,
                stdout,
                stderr: stderr.trim().to_string(),
            })
        }
        None => {
            error!(command = %command, "command terminated by signal");
            Err(ExecError::Signaled { command, dir })
        }
    }
}

pub(crate) fn render_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        return program.to_string();
    }
    format!("{program} {}", args.join(" "))
}

pub(crate) fn snippet(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_SNIPPET_BYTES {
        return trimmed;
    }
    let mut end = STDERR_SNIPPET_BYTES;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    &trimmed[..end]
}
