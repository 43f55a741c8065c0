//! Tooling
//!
//! Command-line entry points over the sync orchestrator.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
