//! CLI argument models and REPL input grammar for the ClauseCompass client.
//!
//! Exposes the clap-backed flag model, the command catalog with its help text,
//! REPL line classification, and command-file parsing shared by the binary's
//! interactive and scripted runtimes.

pub mod cli_args;
pub mod cli_types;
pub mod command_file;
pub mod command_text;

pub use cli_args::Cli;
pub use cli_types::*;
pub use command_file::*;
pub use command_text::*;
