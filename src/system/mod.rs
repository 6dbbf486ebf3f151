//! # System Interaction Layer
//!
//! This module provides abstractions for interacting with the underlying operating system.
//! It is the boundary between the job model and the specifics of process management.
//!
//! ## Modules
//!
//! - **`executor`**: Spawns external processes and waits for them with support for
//!   cancellation, exit-code mapping and optional stdout capture.
//! - **`launcher`**: Runs a job's launch sequence: writes the rendered script to a
//!   temporary file and executes it with the configured shell.
//! - **`signals`**: Listens for Ctrl+C and SIGTERM on a small tokio runtime and flips
//!   the shared cancellation token.

pub mod executor;
pub mod launcher;
pub mod signals;
