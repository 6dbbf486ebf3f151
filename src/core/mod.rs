// src/core/mod.rs

pub mod config_loader;
pub mod env_parser;
pub mod paths;
pub mod plan;
pub mod script_renderer;
