//! CLI layer for bid-analyser.
//!
//! Provides the command-line interface using clap: offline chunk preview,
//! extraction, question answering, translation and an interactive session.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
