//! Command-line interface for robustness-forge.
//!
//! Provides commands for listing registered OOD detection datasets and for
//! computing ensemble diversity over prediction files.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
