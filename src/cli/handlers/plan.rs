// src/cli/handlers/plan.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use super::commons;
use crate::{
    CancellationToken,
    cli::args::PlanArgs,
    core::plan::{CheckSubject, LaunchPlan, LaunchStep},
};

/// The main handler for the `plan` command.
/// Displays the resolved launch sequence without running anything.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let plan_args = PlanArgs::try_parse_from(&args)?;
    let (_, plan) = commons::resolve_plan(&plan_args.job)?;

    if plan_args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    print_header(&plan);
    print_steps(&plan);
    print_checks(&plan);
    Ok(())
}

fn print_header(plan: &LaunchPlan) {
    println!(
        "\n--- {} '{}' ---",
        t!("plan.header"),
        plan.job_name.yellow()
    );
    println!("  {:<12} {}", t!("plan.label.workdir").blue(), plan.workdir.display());
    println!("  {:<12} {}", t!("plan.label.run_id").blue(), plan.run_id);
    let shell = std::iter::once(plan.shell.path.display().to_string())
        .chain(plan.shell.args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    println!("  {:<12} {}", t!("plan.label.shell").blue(), shell);
}

fn print_steps(plan: &LaunchPlan) {
    println!("\n{}", t!("plan.label.steps").bold());
    for (position, step) in plan.steps.iter().enumerate() {
        let number = format!("{:>2}.", position + 1).dimmed();
        println!("  {} {}", number, describe_step(step));
    }
}

fn describe_step(step: &LaunchStep) -> String {
    match step {
        LaunchStep::DeclareJob { name, directives } => {
            let mut line = format!("{} {}", t!("plan.step.declare"), name.cyan());
            for (key, value) in directives {
                line.push_str(&format!(" --{}={}", key, value).dimmed().to_string());
            }
            line
        }
        LaunchStep::LoadRuntime { command, module } => {
            format!("{} {} load {}", t!("plan.step.runtime"), command, module.cyan())
        }
        LaunchStep::SetEnv { key, value } => {
            format!("{} {}={}", t!("plan.step.env"), key.cyan(), value)
        }
        LaunchStep::Activate { script } => {
            format!("{} {}", t!("plan.step.activate"), script.cyan())
        }
        LaunchStep::PrintWorkdir => t!("plan.step.pwd").to_string(),
        LaunchStep::InvokeDriver {
            interpreter,
            program,
            args,
        } => {
            let mut line = format!("{} {} {}", t!("plan.step.driver"), interpreter, program.cyan());
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            line
        }
    }
}

fn print_checks(plan: &LaunchPlan) {
    println!("\n{}", t!("plan.label.checks").bold());
    for check in &plan.checks {
        let subject = match check.subject {
            CheckSubject::ActivationScript => t!("plan.check.activation"),
            CheckSubject::DriverProgram => t!("plan.check.driver"),
        };
        let status = if check.present {
            t!("plan.check.present").green()
        } else {
            t!("plan.check.missing").red().bold()
        };
        println!("  {:<22} {} {}", subject, status, check.path.display().to_string().dimmed());
    }
    println!();
}
