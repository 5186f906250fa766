//! The `speakeasy` command: argument parsing, composition root, and the two
//! front-ends (interactive terminal and headless test run).

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary target only
use dotenvy as _;
use tracing_subscriber as _;

#[cfg(test)]
use tempfile as _;

pub mod bootstrap;
pub mod error;
pub mod headless;
pub mod input;
pub mod parser;
pub mod tui;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, bootstrap};
pub use error::CliError;
pub use parser::Cli;
