// src/cli/handlers/mod.rs

// One module per CLI command.

pub mod commons;
pub mod init;
pub mod plan;
pub mod run;
pub mod script;
pub mod submit;
