// src/cli/handlers/init.rs

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::{env, fs, path::PathBuf};

use super::commons;
use crate::{
    CancellationToken,
    cli::args::InitArgs,
    constants::{DEFAULT_CONFIG_TEMPLATE, PROJECT_CONFIG_FILENAME},
};

/// The main handler for the `init` command.
/// Writes a default, commented `batch.toml` that reproduces the built-in launch sequence.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let init_args = InitArgs::try_parse_from(&args)?;

    let target_dir = match init_args.path {
        Some(path) => path,
        None => env::current_dir().context(t!("common.error.no_cwd"))?,
    };
    let config_path = write_default_config(target_dir, init_args.force)?;

    commons::print_note(&format!(
        t!("init.success"),
        path = config_path.display()
    ));
    Ok(())
}

/// Writes the default template into `target_dir`, creating the directory if needed.
fn write_default_config(target_dir: PathBuf, force: bool) -> Result<PathBuf> {
    let config_path = target_dir.join(PROJECT_CONFIG_FILENAME);
    if config_path.exists() && !force {
        return Err(anyhow!(
            t!("init.error.exists"),
            path = config_path.display()
        ));
    }

    fs::create_dir_all(&target_dir)
        .with_context(|| format!("Failed to create '{}'", target_dir.display()))?;
    fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write '{}'", config_path.display()))?;
    log::debug!("Default configuration written to {}", config_path.display());
    Ok(config_path)
}
