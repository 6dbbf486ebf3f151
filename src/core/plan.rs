// src/core/plan.rs

use crate::{
    constants::PYTHON_PATH_ENV,
    models::{JobSpec, ShellSpec},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One step of the launch sequence. Steps always appear in declaration order.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum LaunchStep {
    /// Names the job for the workload manager.
    DeclareJob {
        name: String,
        directives: BTreeMap<String, String>,
    },
    /// `module load <module>`.
    LoadRuntime { command: String, module: String },
    SetEnv { key: String, value: String },
    /// Sources the virtual environment's activation script.
    Activate { script: String },
    PrintWorkdir,
    /// Replaces the shell with the driver; its status becomes the job's.
    InvokeDriver {
        interpreter: String,
        program: String,
        args: Vec<String>,
    },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckSubject {
    ActivationScript,
    DriverProgram,
}

/// Whether a file the launch depends on is where the job expects it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PreflightCheck {
    pub subject: CheckSubject,
    pub path: PathBuf,
    pub present: bool,
}

/// The ordered launch sequence of one job, plus the facts needed to run it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub job_name: String,
    pub run_id: Uuid,
    pub workdir: PathBuf,
    pub shell: ShellSpec,
    pub submit_command: String,
    pub steps: Vec<LaunchStep>,
    pub checks: Vec<PreflightCheck>,
}

impl LaunchPlan {
    /// Lays out the launch sequence for `job`.
    pub fn build(job: &JobSpec, run_id: Uuid) -> Self {
        let mut steps = vec![LaunchStep::DeclareJob {
            name: job.name.clone(),
            directives: job.scheduler.directives.clone(),
        }];

        if let Some(runtime) = &job.runtime {
            steps.push(LaunchStep::LoadRuntime {
                command: runtime.command.clone(),
                module: runtime.module.clone(),
            });
        }

        if let Some(python_path) = &job.python_path {
            steps.push(LaunchStep::SetEnv {
                key: PYTHON_PATH_ENV.to_string(),
                value: python_path.clone(),
            });
        }
        steps.extend(job.env.iter().map(|(key, value)| LaunchStep::SetEnv {
            key: key.clone(),
            value: value.clone(),
        }));

        steps.push(LaunchStep::Activate {
            script: job.activate.clone(),
        });
        steps.push(LaunchStep::PrintWorkdir);
        steps.push(LaunchStep::InvokeDriver {
            interpreter: job.driver.interpreter.clone(),
            program: job.driver.program.clone(),
            args: job.driver.args.clone(),
        });

        let checks = vec![
            check(
                CheckSubject::ActivationScript,
                &job.workdir,
                &job.activate,
            ),
            check(
                CheckSubject::DriverProgram,
                &job.workdir,
                &job.driver.program,
            ),
        ];

        Self {
            job_name: job.name.clone(),
            run_id,
            workdir: job.workdir.clone(),
            shell: job.shell.clone(),
            submit_command: job.scheduler.submit_command.clone(),
            steps,
            checks,
        }
    }

    /// Checks whose file is missing.
    pub fn failed_checks(&self) -> impl Iterator<Item = &PreflightCheck> {
        self.checks.iter().filter(|c| !c.present)
    }
}

fn check(subject: CheckSubject, workdir: &Path, relative: &str) -> PreflightCheck {
    let path = workdir.join(relative);
    let present = path.is_file();
    PreflightCheck {
        subject,
        path,
        present,
    }
}
