// src/system/executor.rs

use crate::CancellationToken;
use std::io::{self, Read};
use std::process::{Child, Command as StdCommand, ExitStatus, Stdio};
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, #[source] io::Error),
    #[error("Command '{command}' exited with status {code}.")]
    NonZeroExitStatus { command: String, code: i32 },
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Command '{command}' was interrupted.")]
    Interrupted { command: String },
}

/// What happens to the child's standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Shared with the launcher's terminal (or the scheduler's log).
    Inherit,
    /// Collected and returned; stderr still goes to the terminal.
    Capture,
}

/// The result of a child that ran to completion, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    /// Present only in `OutputMode::Capture`.
    pub stdout: Option<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turns a non-zero exit into `ExecutionError::NonZeroExitStatus`.
    pub fn into_result(self, command: &str) -> Result<Self, ExecutionError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ExecutionError::NonZeroExitStatus {
                command: command.to_string(),
                code: self.exit_code,
            })
        }
    }
}

/// Builds a `Command` from a single command line such as `sbatch --parsable`.
pub fn command_from_line(command_line: &str) -> Result<StdCommand, ExecutionError> {
    let trimmed = command_line.trim();
    if trimmed.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }
    let parts =
        shlex::split(trimmed).ok_or_else(|| ExecutionError::CommandParse(trimmed.to_string()))?;
    let (program, args) = parts.split_first().ok_or(ExecutionError::EmptyCommand)?;

    let mut command = StdCommand::new(program);
    command.args(args);
    Ok(command)
}

/// Maps an exit status to a shell-style exit code: the process's own code, or
/// `128 + signal` when it was killed by a signal.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Spawns `command` and blocks until it exits, checking the cancellation token
/// while it runs. A non-zero exit is reported in `ProcessOutput`, not as an error.
///
/// `label` names the command in errors and logs.
pub fn run_to_completion(
    mut command: StdCommand,
    label: &str,
    cancellation_token: &CancellationToken,
    mode: OutputMode,
) -> Result<ProcessOutput, ExecutionError> {
    if cancellation_token.load(Ordering::SeqCst) {
        return Err(ExecutionError::Interrupted {
            command: label.to_string(),
        });
    }

    match mode {
        OutputMode::Inherit => {
            command.stdout(Stdio::inherit()).stdin(Stdio::inherit());
        }
        OutputMode::Capture => {
            command.stdout(Stdio::piped()).stdin(Stdio::null());
        }
    }
    command.stderr(Stdio::inherit());

    log::debug!("Spawning '{}': {:?}", label, command);
    let mut child = command
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(label.to_string(), e))?;

    // Drain stdout on a separate thread so a chatty child never blocks on a full pipe.
    let reader = child.stdout.take().map(spawn_reader);

    let status = wait_with_cancellation(&mut child, label, cancellation_token)?;
    let exit_code = exit_code_of(status);
    log::debug!("'{}' exited with code {}", label, exit_code);

    let stdout = match reader {
        Some(handle) => {
            let bytes = handle
                .join()
                .map_err(|_| {
                    ExecutionError::CommandFailed(
                        label.to_string(),
                        io::Error::other("stdout reader thread panicked"),
                    )
                })?
                .map_err(|e| ExecutionError::CommandFailed(label.to_string(), e))?;
            Some(
                String::from_utf8(bytes).map_err(|e| ExecutionError::InvalidUtf8Output {
                    command: label.to_string(),
                    source: e,
                })?,
            )
        }
        None => None,
    };

    Ok(ProcessOutput { exit_code, stdout })
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        source.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

/// Non-blocking wait loop that kills the child when cancellation is requested.
fn wait_with_cancellation(
    child: &mut Child,
    label: &str,
    cancellation_token: &CancellationToken,
) -> Result<ExitStatus, ExecutionError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if cancellation_token.load(Ordering::SeqCst) {
                    log::debug!(
                        "Cancellation requested, killing child process (PID: {})...",
                        child.id()
                    );
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill child process {}: {}", child.id(), e);
                    }
                    child.wait().ok();
                    return Err(ExecutionError::Interrupted {
                        command: label.to_string(),
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(ExecutionError::CommandFailed(label.to_string(), e)),
        }
    }
}
