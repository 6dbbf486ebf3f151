// src/cli/handlers/commons.rs

// Shared helpers for the command handlers.

use anyhow::{Context, Result};
use colored::Colorize;
use std::{env, path::PathBuf, sync::atomic::Ordering};
use uuid::Uuid;

use crate::{
    CancellationToken,
    cli::args::JobOverrides,
    constants::CONFIG_PATH_ENV,
    core::{config_loader::ConfigLoader, plan::LaunchPlan},
    models::JobSpec,
    system::executor::ExecutionError,
};

/// Returns `Interrupted` once cancellation has been requested.
pub fn check_for_cancellation(cancellation_token: &CancellationToken) -> Result<(), ExecutionError> {
    if cancellation_token.load(Ordering::SeqCst) {
        return Err(ExecutionError::Interrupted {
            command: "atrap-batch".to_string(),
        });
    }
    Ok(())
}

/// Resolves the job described by the configuration files and `overrides`.
pub fn resolve_job(overrides: &JobOverrides) -> Result<JobSpec> {
    let workdir = match &overrides.workdir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context(t!("common.error.no_cwd"))?,
    };
    let config_file = overrides
        .config
        .clone()
        .or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
    let layer = overrides.to_layer()?;

    let job = ConfigLoader::new(workdir)
        .with_config_file(config_file)
        .with_overrides(layer)
        .resolve()?;
    log::debug!("Resolved job: {:?}", job);
    Ok(job)
}

/// Resolves the job and lays out its launch sequence under a fresh run id.
pub fn resolve_plan(overrides: &JobOverrides) -> Result<(JobSpec, LaunchPlan)> {
    let job = resolve_job(overrides)?;
    let plan = LaunchPlan::build(&job, Uuid::new_v4());
    Ok((job, plan))
}

/// Logs a warning for each file the launch expects but cannot find.
/// The launch still proceeds; the shell reports the actual failure.
pub fn warn_failed_checks(plan: &LaunchPlan) {
    for check in plan.failed_checks() {
        log::warn!(
            "{:?} not found at {}",
            check.subject,
            check.path.display()
        );
    }
}

/// Prints a dimmed informational line to stderr, leaving stdout to the job.
pub fn print_note(message: &str) {
    eprintln!("{}", message.dimmed());
}
