//! Command-line interface
//!
//! Argument parsing and command dispatch for the `zoho-export` binary.

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
