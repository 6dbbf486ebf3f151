// src/core/paths.rs

use crate::constants::{USER_CONFIG_DIRNAME, USER_CONFIG_FILENAME};
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref USER_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Failed to expand '{template}': {reason}")]
    Expand { template: String, reason: String },
}

/// Returns the path to the per-user configuration directory (`~/.config/atrap-batch`).
///
/// The directory is only located, never created: a missing directory simply
/// means there is no user layer. The lookup is memoized.
pub fn get_user_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = USER_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(USER_CONFIG_DIRNAME);
    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path of the per-user defaults file, whether or not it exists.
pub fn get_user_config_file() -> Result<PathBuf, PathError> {
    get_user_config_dir().map(|dir| dir.join(USER_CONFIG_FILENAME))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a path-like value.
///
/// # Errors
/// Returns an error if the template references an undefined variable.
pub fn expand_path_template(template: &str) -> Result<String, PathError> {
    shellexpand::full(template)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| PathError::Expand {
            template: template.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_leaves_plain_paths_untouched() {
        assert_eq!(
            expand_path_template("venv/bin/activate").unwrap(),
            "venv/bin/activate"
        );
    }

    #[test]
    fn test_expand_resolves_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let expanded = expand_path_template("~/lib").unwrap();
        assert_eq!(PathBuf::from(expanded), home.join("lib"));
    }

    #[test]
    fn test_expand_fails_on_undefined_variable() {
        let result = expand_path_template("$ATRAP_BATCH_SURELY_UNDEFINED_VAR/lib");
        assert!(matches!(result, Err(PathError::Expand { .. })));
    }

    #[test]
    fn test_user_config_file_lives_in_named_dir() {
        if let Ok(path) = get_user_config_file() {
            assert!(path.ends_with("atrap-batch/config.toml"));
        }
    }
}
