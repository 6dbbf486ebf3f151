// src/cli/handlers/submit.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use lazy_static::lazy_static;
use regex::Regex;

use super::commons;
use crate::{
    CancellationToken,
    cli::args::SubmitArgs,
    core::script_renderer::{self, ScriptFlavor},
    system::{
        executor::{self, OutputMode},
        launcher,
    },
};

lazy_static! {
    // `sbatch` prints "Submitted batch job 123"; `sbatch --parsable` prints "123" or "123;cluster".
    static ref JOB_ID: Regex =
        Regex::new(r"(?m)^(?:Submitted batch job )?(\d+)(?:;\S+)?\s*$").expect("job id pattern is valid");
}

/// The main handler for the `submit` command.
/// Hands the rendered submission script to the workload manager from the job's
/// working directory, so that relative paths resolve the same way as with `run`.
pub fn handle(args: Vec<String>, cancellation_token: &CancellationToken) -> Result<()> {
    let submit_args = SubmitArgs::try_parse_from(&args)?;
    let (_, plan) = commons::resolve_plan(&submit_args.job)?;
    commons::warn_failed_checks(&plan);

    let script = script_renderer::render(&plan, ScriptFlavor::Submission)?;
    let script_file = launcher::write_script(&script)?;

    let mut command = executor::command_from_line(&plan.submit_command)?;
    command.arg(script_file.path()).current_dir(&plan.workdir);

    let output = executor::run_to_completion(
        command,
        &plan.submit_command,
        cancellation_token,
        OutputMode::Capture,
    )?
    .into_result(&plan.submit_command)?;
    let stdout = output.stdout.unwrap_or_default();

    match parse_job_id(&stdout) {
        Some(job_id) => println!(
            "{}",
            format!(
                t!("submit.success"),
                name = plan.job_name.yellow(),
                id = job_id.cyan()
            )
        ),
        None => {
            log::warn!("Could not find a job id in the scheduler output.");
            print!("{}", stdout);
        }
    }
    Ok(())
}

/// Extracts the job id from the scheduler's submission output.
fn parse_job_id(output: &str) -> Option<&str> {
    JOB_ID
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
