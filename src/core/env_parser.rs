// src/core/env_parser.rs

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

lazy_static! {
    static ref ENV_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("environment name pattern is valid");
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvParseError {
    #[error("Expected KEY=VALUE, got '{0}'.")]
    MissingSeparator(String),
    #[error("'{0}' is not a valid environment variable name.")]
    InvalidName(String),
}

/// Whether `name` can be exported by a POSIX shell.
pub fn is_valid_name(name: &str) -> bool {
    ENV_NAME.is_match(name)
}

/// Parses `KEY=VALUE` assignments. The value may itself contain `=`; a later
/// assignment to the same key wins.
pub fn parse_assignments(pairs: &[String]) -> Result<BTreeMap<String, String>, EnvParseError> {
    let mut vars = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| EnvParseError::MissingSeparator(pair.clone()))?;
        let key = key.trim();
        if !is_valid_name(key) {
            return Err(EnvParseError::InvalidName(key.to_string()));
        }
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}
