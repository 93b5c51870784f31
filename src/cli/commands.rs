//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - ask: plan (and by default execute) a question
//! - tools: list the registered tools and actions
//! - explain: explain a saved plan file
//! - run: execute a saved plan file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bioplan - LLM-planned queries over KEGG, Gene Ontology and DrugBank
#[derive(Parser, Debug)]
#[command(name = "bioplan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan, execute and explain a research question
    Ask {
        /// The question, in plain language
        query: String,

        /// Print the full outcome as JSON
        #[arg(short, long)]
        json: bool,

        /// Generate and explain the plan without calling any data source
        #[arg(short, long)]
        plan_only: bool,
    },

    /// List the registered tools and their actions
    Tools,

    /// Explain a saved plan file
    Explain {
        /// Path to a plan JSON file
        plan: PathBuf,
    },

    /// Execute a saved plan file
    Run {
        /// Path to a plan JSON file
        plan: PathBuf,

        /// Print the execution report as JSON
        #[arg(short, long)]
        json: bool,
    },
}
