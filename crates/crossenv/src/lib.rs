//! crossenv - reproducible cross-toolchain environment provisioning
//!
//! The CLI layer over `crossenv-core` and `crossenv-cas`: argument parsing
//! and exit-code mapping, the environment composer, and shell-facing
//! output.

// CLI output goes to stdout/stderr by design.
#![allow(clippy::print_stdout, clippy::print_stderr)]

/// CLI argument parsing, error rendering, and exit codes.
pub mod cli;
/// Command implementations.
pub mod commands;
/// The environment composer.
pub mod composer;
/// Tracing subscriber setup.
pub mod logging;

pub use crossenv_core::Result;
