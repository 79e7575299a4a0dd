//! Library surface of the analyzer CLI.
//!
//! Exposed so integration tests can exercise argument parsing, config
//! loading, and report rendering without spawning the binary.

pub mod cli;
pub mod config;
pub mod report;

pub use cli::{Cli, OutputFormat};
pub use config::Config;
