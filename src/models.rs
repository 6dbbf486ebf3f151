// src/models.rs

//! Configuration models.
//!
//! `BatchConfig` mirrors one `batch.toml` layer exactly as written on disk: every
//! key is optional so that layers can be stacked. `JobSpec` is what remains after
//! all layers have been merged and defaults applied.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// --- `batch.toml` MODELS (one configuration layer) ---

/// One configuration layer, as deserialized from a `batch.toml` file or built
/// from command-line overrides.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    #[serde(default)]
    pub job: JobSection,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub runtime: RuntimeSection,
    #[serde(default)]
    pub environment: EnvironmentSection,
    #[serde(default)]
    pub driver: DriverSection,
    #[serde(default)]
    pub shell: ShellSection,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct JobSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_command: Option<String>,
    /// Extra `#SBATCH --key=value` lines. An empty value renders as a bare flag.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub directives: BTreeMap<String, String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_command: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activate: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DriverSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShellSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

/// Replaces `lower` with `upper` when the upper layer sets a value.
fn overlay_option<T>(lower: &mut Option<T>, upper: Option<T>) {
    if upper.is_some() {
        *lower = upper;
    }
}

impl BatchConfig {
    /// Stacks `upper` on top of `self`. Scalars and lists from `upper` replace
    /// the ones below; maps are merged key by key.
    pub fn overlay(&mut self, upper: Self) {
        overlay_option(&mut self.job.name, upper.job.name);

        overlay_option(
            &mut self.scheduler.submit_command,
            upper.scheduler.submit_command,
        );
        self.scheduler.directives.extend(upper.scheduler.directives);

        overlay_option(&mut self.runtime.module, upper.runtime.module);
        overlay_option(
            &mut self.runtime.module_command,
            upper.runtime.module_command,
        );

        overlay_option(
            &mut self.environment.python_path,
            upper.environment.python_path,
        );
        overlay_option(&mut self.environment.activate, upper.environment.activate);
        self.environment.vars.extend(upper.environment.vars);

        overlay_option(&mut self.driver.interpreter, upper.driver.interpreter);
        overlay_option(&mut self.driver.program, upper.driver.program);
        overlay_option(&mut self.driver.args, upper.driver.args);

        overlay_option(&mut self.shell.path, upper.shell.path);
        overlay_option(&mut self.shell.args, upper.shell.args);
    }
}

// --- RESOLVED MODELS ---

/// A fully resolved job: every layer merged, templates expanded, workdir absolute.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub workdir: PathBuf,
    pub runtime: Option<RuntimeModule>,
    pub python_path: Option<String>,
    pub activate: String,
    pub env: BTreeMap<String, String>,
    pub driver: DriverSpec,
    pub shell: ShellSpec,
    pub scheduler: SchedulerSpec,
}

/// An environment module to load before anything else runs.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RuntimeModule {
    pub command: String,
    pub module: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DriverSpec {
    pub interpreter: String,
    pub program: String,
    pub args: Vec<String>,
}

/// The shell that executes the rendered launch script.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShellSpec {
    pub path: PathBuf,
    pub args: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSpec {
    pub submit_command: String,
    pub directives: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_replaces_scalars_and_merges_maps() {
        let mut lower: BatchConfig = toml::from_str(
            r#"
            [job]
            name = "atrap"

            [environment]
            python_path = "/opt/lib"
            vars = { A = "1", B = "2" }
            "#,
        )
        .unwrap();
        let upper: BatchConfig = toml::from_str(
            r#"
            [job]
            name = "atrap-large"

            [environment]
            vars = { B = "3" }
            "#,
        )
        .unwrap();

        lower.overlay(upper);

        assert_eq!(lower.job.name.as_deref(), Some("atrap-large"));
        assert_eq!(lower.environment.python_path.as_deref(), Some("/opt/lib"));
        assert_eq!(lower.environment.vars.get("A").map(String::as_str), Some("1"));
        assert_eq!(lower.environment.vars.get("B").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_overlay_replaces_lists_wholesale() {
        let mut lower = BatchConfig::default();
        lower.driver.args = Some(vec!["--a".to_string(), "--b".to_string()]);
        let mut upper = BatchConfig::default();
        upper.driver.args = Some(Vec::new());

        lower.overlay(upper);

        assert_eq!(lower.driver.args, Some(Vec::new()));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let toml_str = r#"
            [driver]
            programme = "run_batch.py" # Typo: should be `program`
        "#;
        let result: Result<BatchConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err(), "Should fail due to unknown field 'programme'");
        let error_msg = result.unwrap_err().to_string();
        assert!(
            error_msg.contains("unknown field `programme`"),
            "Error message was: {}",
            error_msg
        );
    }

    #[test]
    fn test_empty_document_is_default_layer() {
        let config: BatchConfig = toml::from_str("").unwrap();
        assert_eq!(config, BatchConfig::default());
    }
}
