// src/core/script_renderer.rs

//! Turns a `LaunchPlan` into a POSIX shell script.
//!
//! Both flavors share the same body. `Submission` adds a shebang and the
//! `#SBATCH` directive block that the workload manager reads before the first
//! command.

use crate::core::{
    env_parser,
    plan::{LaunchPlan, LaunchStep},
};
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("The {field} contains a line break, which would corrupt the script.")]
    LineBreak { field: &'static str },
    #[error("The {field} contains a NUL byte and cannot be quoted for the shell.")]
    Unquotable { field: &'static str },
    #[error("'{0}' is not a valid scheduler directive name.")]
    InvalidDirective(String),
    #[error("'{0}' is not a valid environment variable name.")]
    InvalidVarName(String),
}

/// Which kind of script to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFlavor {
    /// Executed directly by the launcher through the configured shell.
    Launch,
    /// Handed to the workload manager (`sbatch`).
    Submission,
}

/// Renders the plan's steps, in order, as a shell script that stops at the
/// first failing step.
pub fn render(plan: &LaunchPlan, flavor: ScriptFlavor) -> Result<String, RenderError> {
    let mut script = String::new();

    if flavor == ScriptFlavor::Submission {
        script.push_str(&shebang(plan));
        script.push('\n');
    }

    for step in &plan.steps {
        match step {
            LaunchStep::DeclareJob { name, directives } => {
                reject_line_breaks(name, "job name")?;
                match flavor {
                    ScriptFlavor::Submission => {
                        script.push_str(&format!(
                            "#SBATCH --job-name={}\n",
                            quote(name, "job name")?
                        ));
                        for (key, value) in directives {
                            if key.is_empty()
                                || key.chars().any(|c| c.is_whitespace() || c == '=')
                            {
                                return Err(RenderError::InvalidDirective(key.clone()));
                            }
                            if value.is_empty() {
                                script.push_str(&format!("#SBATCH --{}\n", key));
                            } else {
                                script.push_str(&format!(
                                    "#SBATCH --{}={}\n",
                                    key,
                                    quote(value, "directive value")?
                                ));
                            }
                        }
                        script.push('\n');
                    }
                    ScriptFlavor::Launch => {
                        script.push_str(&format!(
                            "# atrap-batch job '{}' (run {})\n",
                            name, plan.run_id
                        ));
                    }
                }
                script.push_str("set -e\n\n");
            }
            LaunchStep::LoadRuntime { command, module } => {
                script.push_str(&format!(
                    "{} load {}\n",
                    quote(command, "module command")?,
                    quote(module, "runtime module")?
                ));
            }
            LaunchStep::SetEnv { key, value } => {
                if !env_parser::is_valid_name(key) {
                    return Err(RenderError::InvalidVarName(key.clone()));
                }
                script.push_str(&format!(
                    "export {}={}\n",
                    key,
                    quote(value, "environment value")?
                ));
            }
            LaunchStep::Activate { script: activate } => {
                script.push_str(&format!(". {}\n", quote(activate, "activation script")?));
            }
            LaunchStep::PrintWorkdir => script.push_str("pwd\n"),
            LaunchStep::InvokeDriver {
                interpreter,
                program,
                args,
            } => {
                let mut line = format!(
                    "exec {} {}",
                    quote(interpreter, "interpreter")?,
                    quote(program, "driver program")?
                );
                for arg in args {
                    line.push(' ');
                    line.push_str(&quote(arg, "driver argument")?);
                }
                script.push_str(&line);
                script.push('\n');
            }
        }
    }

    Ok(script)
}

fn shebang(plan: &LaunchPlan) -> String {
    let shell = &plan.shell;
    if shell.path.is_absolute() {
        let mut line = format!("#!{}", shell.path.display());
        for arg in &shell.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    } else if shell.args.is_empty() {
        format!("#!/usr/bin/env {}", shell.path.display())
    } else {
        format!(
            "#!/usr/bin/env -S {} {}",
            shell.path.display(),
            shell.args.join(" ")
        )
    }
}

fn reject_line_breaks(value: &str, field: &'static str) -> Result<(), RenderError> {
    if value.contains(['\n', '\r']) {
        return Err(RenderError::LineBreak { field });
    }
    Ok(())
}

fn quote<'a>(value: &'a str, field: &'static str) -> Result<Cow<'a, str>, RenderError> {
    reject_line_breaks(value, field)?;
    shlex::try_quote(value).map_err(|_| RenderError::Unquotable { field })
}
