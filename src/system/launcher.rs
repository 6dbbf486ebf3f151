// src/system/launcher.rs

use crate::{
    CancellationToken,
    constants::{JOB_NAME_ENV, RUN_ID_ENV, SCRIPT_FILE_PREFIX},
    core::{
        plan::LaunchPlan,
        script_renderer::{self, RenderError, ScriptFlavor},
    },
    system::executor::{self, ExecutionError, OutputMode},
};
use std::io::{self, Write};
use std::process::Command;
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Could not render the launch script: {0}")]
    Render(#[from] RenderError),
    #[error("Could not write the launch script: {0}")]
    ScriptFile(#[from] io::Error),
    #[error("{0}")]
    Execution(#[from] ExecutionError),
}

/// How a launch ended. A non-zero `exit_code` is the status of the step that
/// stopped the sequence, or the driver's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub run_id: Uuid,
    pub exit_code: i32,
    pub stdout: Option<String>,
}

/// Runs the launch sequence of `plan`.
///
/// 1.  Renders the plan into a temporary shell script.
/// 2.  Runs it with the configured shell from the job's working directory, with
///     the job name and run id exported.
/// 3.  Waits for the shell (which `exec`s into the driver) and reports its exit code.
///
/// The launcher's own environment and working directory are left untouched.
pub fn launch(
    plan: &LaunchPlan,
    cancellation_token: &CancellationToken,
    mode: OutputMode,
) -> Result<LaunchOutcome, LaunchError> {
    let script = script_renderer::render(plan, ScriptFlavor::Launch)?;
    let script_file = write_script(&script)?;
    log::debug!(
        "Launch script for run {} written to {}",
        plan.run_id,
        script_file.path().display()
    );
    log::trace!("Launch script:\n{}", script);

    let mut command = Command::new(&plan.shell.path);
    command
        .args(&plan.shell.args)
        .arg(script_file.path())
        .current_dir(&plan.workdir)
        .env("PWD", &plan.workdir)
        .env(JOB_NAME_ENV, &plan.job_name)
        .env(RUN_ID_ENV, plan.run_id.to_string());

    let label = format!("{} (job '{}')", plan.shell.path.display(), plan.job_name);
    let output = executor::run_to_completion(command, &label, cancellation_token, mode)?;

    if let Err(e) = script_file.close() {
        log::warn!("Failed to remove temporary launch script: {}", e);
    }

    Ok(LaunchOutcome {
        run_id: plan.run_id,
        exit_code: output.exit_code,
        stdout: output.stdout,
    })
}

/// Writes `script` to a fresh temporary file that is deleted when dropped.
pub fn write_script(script: &str) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(SCRIPT_FILE_PREFIX)
        .suffix(".sh")
        .tempfile()?;
    file.write_all(script.as_bytes())?;
    file.flush()?;
    Ok(file)
}
