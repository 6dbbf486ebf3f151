//! atrap-batch: a batch job launcher for the ATRAP driver.
//!
//! Resolves a job from layered `batch.toml` configuration, renders its linear
//! launch sequence (runtime module, search path, virtual environment, working
//! directory, driver) as a shell script, and runs or submits it.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Shared flag set when the launch must stop (Ctrl+C, SIGTERM).
pub type CancellationToken = Arc<AtomicBool>;

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
