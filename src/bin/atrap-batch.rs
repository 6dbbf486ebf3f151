// src/bin/atrap-batch.rs

use anyhow::{Result, anyhow};
use atrap_batch::{
    CancellationToken,
    cli::{Cli, handlers},
    constants::INTERRUPTED_EXIT_CODE,
    system::{executor::ExecutionError, signals},
    t,
};
use clap::Parser;
use colored::*;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

// --- Command Definition and Registry ---

/// Defines a command, its aliases, and its handler function.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &CancellationToken) -> Result<()>,
}

/// Every command the launcher understands. `run` is the default.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "init",
        aliases: &["new"],
        handler: handlers::init::handle,
    },
    CommandDefinition {
        name: "plan",
        aliases: &["show"],
        handler: handlers::plan::handle,
    },
    CommandDefinition {
        name: "run",
        aliases: &["launch"],
        handler: handlers::run::handle,
    },
    CommandDefinition {
        name: "script",
        aliases: &["render"],
        handler: handlers::script::handle,
    },
    CommandDefinition {
        name: "submit",
        aliases: &[],
        handler: handlers::submit::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// The main entry point of `atrap-batch`.
/// It sets up logging and signal handling, parses arguments, dispatches to the
/// correct handler, and turns the outcome into the process exit status.
fn main() {
    let cancellation_token = Arc::new(AtomicBool::new(false));
    env_logger::init();

    if let Err(e) = signals::install_interrupt_handler(cancellation_token.clone()) {
        log::warn!("Signal handling unavailable: {}", e);
    }

    if let Err(e) = run_cli(Cli::parse(), &cancellation_token) {
        // --- Centralized Error Handling ---
        // Usage errors and `--help` inside a command are rendered by clap itself.
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            clap_err.exit();
        }

        if let Some(exec_err) = e.chain().find_map(|c| c.downcast_ref::<ExecutionError>()) {
            match exec_err {
                // The failing step or the driver already reported on stderr;
                // its status becomes ours.
                ExecutionError::NonZeroExitStatus { command, code } => {
                    log::debug!("'{}' exited with status {}", command, code);
                    std::process::exit(*code);
                }
                ExecutionError::Interrupted { .. } => {
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
                _ => {}
            }
        }

        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Routes the raw arguments to a command handler.
///
/// - `atrap-batch` and `atrap-batch --flag ...` run the job (`run`).
/// - `atrap-batch <command> [args...]` runs the named command.
fn run_cli(cli: Cli, cancellation_token: &CancellationToken) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let mut args = cli.args;
    let command = match args.first() {
        None => "run".to_string(),
        Some(first) if first.starts_with('-') => "run".to_string(),
        Some(_) => args.remove(0),
    };

    let definition =
        find_command(&command).ok_or_else(|| anyhow!(t!("cli.error.unknown_command"), name = command))?;
    (definition.handler)(args, cancellation_token)
}
