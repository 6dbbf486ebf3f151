//! CLI tests for the `atrap-batch` binary.
//!
//! Each test builds a throwaway job directory with a fake virtual environment
//! and a `sh` driver, then spawns the binary and checks exit codes and output.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const DRIVER_MARKER: &str = "DRIVER-OUTPUT";

struct JobDir {
    _temp: tempfile::TempDir,
    root: PathBuf,
}

impl JobDir {
    /// A job directory whose driver prints a marker and exits with `driver_exit`.
    fn new(driver_exit: i32) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = dunce::canonicalize(temp.path()).expect("canonical tempdir");

        fs::create_dir_all(root.join("venv/bin")).expect("venv dir");
        fs::write(root.join("venv/bin/activate"), "export VENV_ACTIVE=1\n").expect("activate");
        fs::write(
            root.join("driver.sh"),
            format!("echo \"{} $VENV_ACTIVE\"\nexit {}\n", DRIVER_MARKER, driver_exit),
        )
        .expect("driver");
        fs::write(
            root.join("batch.toml"),
            r#"
[job]
name = "atrap-test"

[runtime]
module = ""

[environment]
python_path = "/opt/atrap/lib"
activate = "venv/bin/activate"

[driver]
interpreter = "sh"
program = "driver.sh"

[shell]
path = "sh"
"#,
        )
        .expect("batch.toml");

        Self { _temp: temp, root }
    }

    fn path(&self) -> &Path {
        &self.root
    }

    /// The binary, started from the job directory with an isolated user config dir.
    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_atrap-batch"));
        command
            .current_dir(&self.root)
            .env("XDG_CONFIG_HOME", self.root.join(".config"))
            .env("HOME", &self.root)
            .env_remove("ATRAP_BATCH_CONFIG")
            .env_remove("RUST_LOG")
            .args(args);
        command
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("spawn atrap-batch")
    }
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf-8 stdout")
}

#[test]
fn run_prints_workdir_then_driver_output_and_exits_zero() {
    let job = JobDir::new(0);

    let output = job.run(&["run"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.first().map(Path::new), Some(job.path()));
    assert_eq!(lines.get(1).copied(), Some("DRIVER-OUTPUT 1"));
}

#[test]
fn run_is_the_default_command() {
    let job = JobDir::new(0);

    let output = job.run(&[]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains(DRIVER_MARKER));
}

#[test]
fn driver_exit_status_becomes_launcher_exit_status() {
    let job = JobDir::new(5);

    let output = job.run(&["run"]);

    assert_eq!(output.status.code(), Some(5));
    assert!(stdout_of(&output).contains(DRIVER_MARKER));
}

#[test]
fn missing_activation_script_fails_before_the_driver() {
    let job = JobDir::new(0);
    fs::remove_file(job.path().join("venv/bin/activate")).expect("remove activate");

    let output = job.run(&["run"]);

    assert_ne!(output.status.code(), Some(0));
    assert!(!stdout_of(&output).contains(DRIVER_MARKER));
}

#[test]
fn unavailable_runtime_fails_before_any_further_step() {
    let job = JobDir::new(0);

    let output = job.run(&["run", "--module", "python/3.6.3"]);

    // `sh` has no `module` command here, which is exactly an unavailable runtime.
    assert_ne!(output.status.code(), Some(0));
    assert!(stdout_of(&output).is_empty());
}

#[test]
fn runtime_module_is_loaded_by_default() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_atrap-batch"))
        .current_dir(temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join(".config"))
        .env_remove("ATRAP_BATCH_CONFIG")
        .args(["run", "--dry-run"])
        .output()
        .expect("spawn atrap-batch");

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("set -e\n\nmodule load python/3.6.3\n. venv/bin/activate\n"));
}

#[test]
fn command_line_overrides_the_config_file() {
    let job = JobDir::new(0);
    fs::write(job.path().join("other.sh"), "echo OTHER-DRIVER\n").expect("other driver");

    let output = job.run(&["--driver", "other.sh"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("OTHER-DRIVER"));
    assert!(!stdout.contains(DRIVER_MARKER));
}

#[test]
fn dry_run_prints_the_script_without_running_it() {
    let job = JobDir::new(0);

    let output = job.run(&["run", "--dry-run"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("export PYTHONPATH=/opt/atrap/lib\n"));
    assert!(stdout.contains(". venv/bin/activate\npwd\nexec sh driver.sh\n"));
    assert!(!stdout.contains("DRIVER-OUTPUT 1"));
}

#[test]
fn script_declares_the_job_name_for_the_scheduler() {
    let job = JobDir::new(0);

    let output = job.run(&["script"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("#!/usr/bin/env sh"));
    assert_eq!(lines.next(), Some("#SBATCH --job-name=atrap-test"));
}

#[test]
fn script_can_be_written_to_a_file() {
    let job = JobDir::new(0);
    let target = job.path().join("job.sbatch");

    let output = job.run(&["render", "-o", target.to_str().expect("utf-8 path")]);

    assert_eq!(output.status.code(), Some(0));
    let content = fs::read_to_string(&target).expect("script file");
    assert!(content.contains("#SBATCH --job-name=atrap-test"));
}

#[test]
fn plan_json_lists_steps_and_checks() {
    let job = JobDir::new(0);

    let output = job.run(&["plan", "--json"]);

    assert_eq!(output.status.code(), Some(0));
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json plan");
    assert_eq!(plan["job_name"], "atrap-test");
    let steps: Vec<&str> = plan["steps"]
        .as_array()
        .expect("steps array")
        .iter()
        .filter_map(|s| s["step"].as_str())
        .collect();
    assert_eq!(
        steps,
        vec!["declare_job", "set_env", "activate", "print_workdir", "invoke_driver"]
    );
    assert_eq!(plan["checks"][0]["present"], true);
}

#[test]
fn config_path_can_come_from_the_environment() {
    let job = JobDir::new(0);
    let elsewhere = job.path().join("alt.toml");
    fs::write(&elsewhere, "[job]\nname = \"from-env\"\n").expect("alt config");

    let output = Command::new(env!("CARGO_BIN_EXE_atrap-batch"))
        .current_dir(job.path())
        .env("XDG_CONFIG_HOME", job.path().join(".config"))
        .env("ATRAP_BATCH_CONFIG", &elsewhere)
        .args(["plan", "--json"])
        .output()
        .expect("spawn atrap-batch");

    assert_eq!(output.status.code(), Some(0));
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json plan");
    assert_eq!(plan["job_name"], "from-env");
}

#[test]
fn init_writes_a_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let target = temp.path().join("new-job");

    let first = Command::new(env!("CARGO_BIN_EXE_atrap-batch"))
        .args(["init", target.to_str().expect("utf-8 path")])
        .output()
        .expect("spawn atrap-batch");
    assert_eq!(first.status.code(), Some(0));
    assert!(target.join("batch.toml").is_file());

    let second = Command::new(env!("CARGO_BIN_EXE_atrap-batch"))
        .args(["init", target.to_str().expect("utf-8 path")])
        .output()
        .expect("spawn atrap-batch");
    assert_eq!(second.status.code(), Some(1));
}

#[test]
fn unknown_command_is_an_error() {
    let job = JobDir::new(0);

    let output = job.run(&["frobnicate"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("frobnicate"));
}

#[test]
fn bad_env_assignment_is_an_error() {
    let job = JobDir::new(0);

    let output = job.run(&["run", "--env", "NOT_AN_ASSIGNMENT"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!stdout_of(&output).contains(DRIVER_MARKER));
}

/// Starts a job whose driver records its pid and sleeps, sends `signal` to the
/// launcher once the driver runs, and returns the launcher's exit code along
/// with the driver's pid.
fn interrupt_running_job(signal: &str) -> (Option<i32>, String) {
    let job = JobDir::new(0);
    fs::write(
        job.path().join("driver.sh"),
        "echo $$ > driver.pid.tmp\nmv driver.pid.tmp driver.pid\nexec sleep 30\n",
    )
    .expect("sleeping driver");

    let mut launcher = job
        .command(&["run"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn atrap-batch");

    let pid_file = job.path().join("driver.pid");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !pid_file.exists() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    let driver_pid = fs::read_to_string(&pid_file)
        .expect("driver started")
        .trim()
        .to_string();

    let sent = Command::new("kill")
        .arg(format!("-{}", signal))
        .arg(launcher.id().to_string())
        .status()
        .expect("run kill");
    assert!(sent.success());

    let status = launcher.wait().expect("wait for atrap-batch");
    (status.code(), driver_pid)
}

fn is_running(pid: &str) -> bool {
    Command::new("kill")
        .args(["-0", pid])
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

#[test]
fn sigterm_stops_the_driver_and_exits_130() {
    let (code, driver_pid) = interrupt_running_job("TERM");

    assert_eq!(code, Some(130));
    assert!(!is_running(&driver_pid));
}

#[test]
fn sigint_stops_the_driver_and_exits_130() {
    let (code, driver_pid) = interrupt_running_job("INT");

    assert_eq!(code, Some(130));
    assert!(!is_running(&driver_pid));
}
