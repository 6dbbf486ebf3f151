// src/cli/handlers/run.rs

use anyhow::Result;
use clap::Parser;

use super::commons;
use crate::{
    CancellationToken,
    cli::args::RunArgs,
    core::script_renderer::{self, ScriptFlavor},
    system::{
        executor::{ExecutionError, OutputMode},
        launcher,
    },
};

/// The main handler for the `run` command.
///
/// Resolves the job, then runs its launch sequence: load the runtime module,
/// export the search path, activate the environment, print the working
/// directory and `exec` the driver. The driver's exit status is propagated
/// through `ExecutionError::NonZeroExitStatus`.
pub fn handle(args: Vec<String>, cancellation_token: &CancellationToken) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;
    let (job, plan) = commons::resolve_plan(&run_args.job)?;

    if run_args.dry_run {
        print!("{}", script_renderer::render(&plan, ScriptFlavor::Launch)?);
        return Ok(());
    }

    commons::warn_failed_checks(&plan);
    commons::check_for_cancellation(cancellation_token)?;

    log::info!(
        "Launching job '{}' (run {}) in {}",
        plan.job_name,
        plan.run_id,
        plan.workdir.display()
    );
    let outcome = launcher::launch(&plan, cancellation_token, OutputMode::Inherit)?;

    if outcome.exit_code != 0 {
        return Err(ExecutionError::NonZeroExitStatus {
            command: job.driver.program,
            code: outcome.exit_code,
        }
        .into());
    }
    log::info!("Job '{}' (run {}) finished", plan.job_name, outcome.run_id);
    Ok(())
}
