// src/cli/handlers/script.rs

use anyhow::{Context, Result};
use clap::Parser;
use std::{fs, path::Path};

use super::commons;
use crate::{
    CancellationToken,
    cli::args::ScriptArgs,
    core::script_renderer::{self, ScriptFlavor},
};

/// The main handler for the `script` command.
/// Renders the scheduler submission script to stdout or to `--output`.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let script_args = ScriptArgs::try_parse_from(&args)?;
    let (_, plan) = commons::resolve_plan(&script_args.job)?;
    let script = script_renderer::render(&plan, ScriptFlavor::Submission)?;

    match &script_args.output {
        Some(path) => {
            write_executable(path, &script)?;
            commons::print_note(&format!(
                t!("script.info.written"),
                path = path.display()
            ));
        }
        None => print!("{}", script),
    }
    Ok(())
}

fn write_executable(path: &Path, script: &str) -> Result<()> {
    fs::write(path, script)
        .with_context(|| format!("Failed to write script to '{}'", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}
