// src/cli/args.rs
use clap::{Args, Parser};
use std::path::PathBuf;

use crate::{
    core::env_parser::{self, EnvParseError},
    models::BatchConfig,
};

/// Flags that override the configuration files for a single invocation.
/// Shared by every command that resolves a job.
#[derive(Args, Debug, Default, Clone)]
pub struct JobOverrides {
    /// Configuration file to use instead of `batch.toml` in the working directory.
    /// Falls back to `$ATRAP_BATCH_CONFIG`.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Directory the job runs in. Defaults to the current directory.
    #[arg(long, short = 'C')]
    pub workdir: Option<PathBuf>,

    /// Scheduler job name.
    #[arg(long)]
    pub job_name: Option<String>,

    /// Runtime module to load. An empty value skips the step.
    #[arg(long)]
    pub module: Option<String>,

    /// Value exported as PYTHONPATH. An empty value skips the step.
    #[arg(long)]
    pub python_path: Option<String>,

    /// Activation script of the virtual environment, relative to the working directory.
    #[arg(long)]
    pub activate: Option<String>,

    /// Interpreter that runs the driver.
    #[arg(long)]
    pub interpreter: Option<String>,

    /// Driver program handed to the interpreter.
    #[arg(long)]
    pub driver: Option<String>,

    /// Extra environment variable for the job ("KEY=VALUE"). Repeat for more.
    #[arg(long, value_name = "KEY=VALUE")]
    pub env: Vec<String>,
}

impl JobOverrides {
    /// Builds the topmost configuration layer from the flags that were given.
    pub fn to_layer(&self) -> Result<BatchConfig, EnvParseError> {
        let mut layer = BatchConfig::default();
        layer.job.name = self.job_name.clone();
        layer.runtime.module = self.module.clone();
        layer.environment.python_path = self.python_path.clone();
        layer.environment.activate = self.activate.clone();
        layer.environment.vars = env_parser::parse_assignments(&self.env)?;
        layer.driver.interpreter = self.interpreter.clone();
        layer.driver.program = self.driver.clone();
        Ok(layer)
    }
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Prepares the job environment and runs the driver.")]
pub struct RunArgs {
    #[command(flatten)]
    pub job: JobOverrides,

    /// Print the launch script instead of running it.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows the resolved launch sequence.")]
pub struct PlanArgs {
    #[command(flatten)]
    pub job: JobOverrides,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Renders the scheduler submission script.")]
pub struct ScriptArgs {
    #[command(flatten)]
    pub job: JobOverrides,

    /// Write the script to this file instead of standard output.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Submits the job to the workload manager.")]
pub struct SubmitArgs {
    #[command(flatten)]
    pub job: JobOverrides,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Writes a default batch.toml.")]
pub struct InitArgs {
    /// Directory to write `batch.toml` into. Defaults to the current directory.
    pub path: Option<PathBuf>,

    /// Overwrite an existing `batch.toml`.
    #[arg(long)]
    pub force: bool,
}
