//! # Config Loader
//!
//! This module provides the `ConfigLoader` struct, which stacks the configuration
//! layers of a job and resolves them into a `JobSpec`. From lowest to highest
//! precedence the layers are:
//!
//! 1. built-in defaults (see `constants`),
//! 2. the per-user file (`~/.config/atrap-batch/config.toml`), when present,
//! 3. the project file (`--config`, `$ATRAP_BATCH_CONFIG`, or `batch.toml` in the workdir),
//! 4. command-line overrides.
use crate::{
    constants::{
        DEFAULT_ACTIVATE_SCRIPT, DEFAULT_DRIVER_PROGRAM, DEFAULT_INTERPRETER, DEFAULT_JOB_NAME,
        DEFAULT_MODULE_COMMAND, DEFAULT_RUNTIME_MODULE, DEFAULT_SHELL, DEFAULT_SUBMIT_COMMAND,
        PROJECT_CONFIG_FILENAME,
    },
    core::{
        env_parser,
        paths::{self, PathError},
    },
    models::{BatchConfig, DriverSpec, JobSpec, RuntimeModule, SchedulerSpec, ShellSpec},
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file '{}' does not exist.", .0.display())]
    NotFound(PathBuf),
    #[error("Could not read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid configuration in '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Working directory '{}' is not usable: {source}", .path.display())]
    Workdir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Working directory '{}' is not a directory.", .0.display())]
    WorkdirNotADirectory(PathBuf),
    #[error("'{0}' in [environment.vars] is not a valid environment variable name.")]
    InvalidVarName(String),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Stacks configuration layers for one job.
#[derive(Debug)]
pub struct ConfigLoader {
    workdir: PathBuf,
    config_file: Option<PathBuf>,
    user_config: Option<PathBuf>,
    overrides: BatchConfig,
}

impl ConfigLoader {
    /// Creates a loader for a job running in `workdir`, with the user layer
    /// taken from the system config directory.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let user_config = match paths::get_user_config_file() {
            Ok(path) => Some(path),
            Err(e) => {
                log::debug!("No user configuration layer: {}", e);
                None
            }
        };
        Self {
            workdir: workdir.into(),
            config_file: None,
            user_config,
            overrides: BatchConfig::default(),
        }
    }

    /// Uses an explicit project file instead of `<workdir>/batch.toml`.
    /// The file must exist.
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Replaces the user layer. `None` disables it.
    pub fn with_user_config(mut self, path: Option<PathBuf>) -> Self {
        self.user_config = path;
        self
    }

    /// Sets the topmost layer, usually built from command-line flags.
    pub fn with_overrides(mut self, overrides: BatchConfig) -> Self {
        self.overrides = overrides;
        self
    }

    /// Merges every layer into a single `BatchConfig`, without applying defaults.
    pub fn load_layers(&self) -> Result<BatchConfig, ConfigError> {
        let mut merged = BatchConfig::default();

        if let Some(user_path) = &self.user_config {
            if user_path.is_file() {
                log::debug!("Loading user layer from {}", user_path.display());
                merged.overlay(load_layer(user_path)?);
            } else {
                log::trace!("User layer {} not present", user_path.display());
            }
        }

        match &self.config_file {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound(explicit.clone()));
                }
                log::debug!("Loading project layer from {}", explicit.display());
                merged.overlay(load_layer(explicit)?);
            }
            None => {
                let discovered = self.workdir.join(PROJECT_CONFIG_FILENAME);
                if discovered.is_file() {
                    log::debug!("Loading project layer from {}", discovered.display());
                    merged.overlay(load_layer(&discovered)?);
                } else {
                    log::debug!(
                        "No {} in {}; using defaults",
                        PROJECT_CONFIG_FILENAME,
                        self.workdir.display()
                    );
                }
            }
        }

        merged.overlay(self.overrides.clone());
        Ok(merged)
    }

    /// Resolves the final `JobSpec`: merges the layers, fills in defaults,
    /// expands `~`/`$VAR` in path-like values (`python_path`, `activate`,
    /// `driver.program`) and canonicalizes the workdir.
    pub fn resolve(&self) -> Result<JobSpec, ConfigError> {
        let workdir = dunce::canonicalize(&self.workdir).map_err(|e| ConfigError::Workdir {
            path: self.workdir.clone(),
            source: e,
        })?;
        if !workdir.is_dir() {
            return Err(ConfigError::WorkdirNotADirectory(workdir));
        }

        let layers = self.load_layers()?;
        log::trace!("Merged configuration layers: {:?}", layers);

        let module = layers
            .runtime
            .module
            .unwrap_or_else(|| DEFAULT_RUNTIME_MODULE.to_string());
        let runtime = non_empty(Some(module)).map(|module| RuntimeModule {
            command: layers
                .runtime
                .module_command
                .unwrap_or_else(|| DEFAULT_MODULE_COMMAND.to_string()),
            module,
        });

        let python_path = non_empty(layers.environment.python_path)
            .map(|p| paths::expand_path_template(&p))
            .transpose()?;

        let activate = paths::expand_path_template(
            layers
                .environment
                .activate
                .as_deref()
                .unwrap_or(DEFAULT_ACTIVATE_SCRIPT),
        )?;

        // Values are exported verbatim; only path-like keys are expanded.
        let env = layers.environment.vars;
        if let Some(key) = env.keys().find(|k| !env_parser::is_valid_name(k)) {
            return Err(ConfigError::InvalidVarName(key.clone()));
        }

        let driver = DriverSpec {
            interpreter: layers
                .driver
                .interpreter
                .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            program: paths::expand_path_template(
                layers
                    .driver
                    .program
                    .as_deref()
                    .unwrap_or(DEFAULT_DRIVER_PROGRAM),
            )?,
            args: layers.driver.args.unwrap_or_default(),
        };

        let shell = ShellSpec {
            path: layers
                .shell
                .path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SHELL)),
            args: layers.shell.args.unwrap_or_default(),
        };

        let scheduler = SchedulerSpec {
            submit_command: layers
                .scheduler
                .submit_command
                .unwrap_or_else(|| DEFAULT_SUBMIT_COMMAND.to_string()),
            directives: layers.scheduler.directives,
        };

        Ok(JobSpec {
            name: layers
                .job
                .name
                .unwrap_or_else(|| DEFAULT_JOB_NAME.to_string()),
            workdir,
            runtime,
            python_path,
            activate,
            env,
            driver,
            shell,
            scheduler,
        })
    }
}

/// An empty or blank value switches the step off.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Reads and parses a single `batch.toml` layer.
pub fn load_layer(path: &Path) -> Result<BatchConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
