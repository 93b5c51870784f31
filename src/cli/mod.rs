//! CLI module for bioplan - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for answering questions,
//! listing tools, and explaining or running saved plans.

pub mod commands;

pub use commands::Cli;
