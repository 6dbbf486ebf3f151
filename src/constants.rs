// src/constants.rs

/// The name of the project configuration file, looked up in the working directory.
pub const PROJECT_CONFIG_FILENAME: &str = "batch.toml";

/// The name of the directory holding per-user configuration (inside the system config dir).
pub const USER_CONFIG_DIRNAME: &str = "atrap-batch";

/// The name of the per-user defaults file (inside `USER_CONFIG_DIRNAME`).
pub const USER_CONFIG_FILENAME: &str = "config.toml";

/// Environment variable that points at an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "ATRAP_BATCH_CONFIG";

/// Exported to the launched shell: the scheduler job name.
pub const JOB_NAME_ENV: &str = "ATRAP_BATCH_JOB_NAME";

/// Exported to the launched shell: the unique id of this launch.
pub const RUN_ID_ENV: &str = "ATRAP_BATCH_RUN_ID";

/// The interpreter's module search path variable.
pub const PYTHON_PATH_ENV: &str = "PYTHONPATH";

/// Prefix for rendered scripts written to the temp directory.
pub const SCRIPT_FILE_PREFIX: &str = "atrap-batch-";

pub const DEFAULT_JOB_NAME: &str = "atrap";
pub const DEFAULT_SUBMIT_COMMAND: &str = "sbatch";
pub const DEFAULT_RUNTIME_MODULE: &str = "python/3.6.3";
pub const DEFAULT_MODULE_COMMAND: &str = "module";
pub const DEFAULT_ACTIVATE_SCRIPT: &str = "venv/bin/activate";
pub const DEFAULT_INTERPRETER: &str = "python";
pub const DEFAULT_DRIVER_PROGRAM: &str = "run_batch.py";
pub const DEFAULT_SHELL: &str = "bash";

/// Exit code reported when the launch is interrupted by a signal.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Written by `atrap-batch init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# atrap-batch configuration.
# Every key is optional; unset keys fall back to ~/.config/atrap-batch/config.toml
# and then to the built-in defaults shown here.

[job]
name = "atrap"

[scheduler]
submit_command = "sbatch"
# directives = { time = "24:00:00", mem = "8G" }

[runtime]
# Loaded with `module load` before anything else. Set to "" to skip the step.
module = "python/3.6.3"
module_command = "module"

[environment]
# Exported as PYTHONPATH. The path is not checked.
# python_path = "/home/user/atrap"
activate = "venv/bin/activate"
# vars = { OMP_NUM_THREADS = "1" }

[driver]
interpreter = "python"
program = "run_batch.py"
args = []

[shell]
path = "bash"
# Use ["-l"] when `module` is only defined for login shells.
args = []
"#;
