//! CLI module for toolsession - command-line interface and subcommands.
//!
//! Interactive chat is the default; `tools` manages the tool registry.

pub mod commands;

pub use commands::Cli;
