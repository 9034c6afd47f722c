//! CLI module for gitopsctl.
//!
//! This module provides the command-line interface for deploying values
//! and creating preview environments.

mod commands;
mod output;

pub use commands::{Cli, Commands, GitArgs, LogFormat, OutputFormat};
pub use output::OutputFormatter;
