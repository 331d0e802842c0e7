//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "taskforge")]
#[command(about = "Taskforge - Phase-gated build orchestration core", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a config file (defaults to the .taskforge/ hierarchy)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a task graph file and print its execution order
    Validate {
        /// Path to the task graph JSON file
        graph: PathBuf,
    },

    /// Run a session over a task graph with scripted collaborators
    Run {
        /// Path to the task graph JSON file
        graph: PathBuf,

        /// Path to a build spec YAML file
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Comma-separated task ids that should fail once before succeeding
        #[arg(long, value_delimiter = ',')]
        fail_once: Vec<String>,

        /// Number of verification passes that fail before one succeeds
        #[arg(long, default_value = "0")]
        fail_verification: usize,
    },

    /// Print the effective merged configuration
    Config,
}
