//! CLI argument definitions for stackcheck.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stackcheck")]
#[command(version)]
#[command(about = "Configuration-drift and compliance checking for compose stacks", long_about = None)]
#[command(
    after_help = "Run from (or point --root at) a directory containing compose manifests,\na canonical .env.example, and a documentation corpus. With no subcommand,\nthe full check runs and the exit status reports pass/fail."
)]
pub struct Cli {
    /// Suppress all non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Stack directory to check
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full check: drift, service rules, and documentation coverage
    ///
    /// This is the default when no subcommand is given. Exit status is 0
    /// when no hard finding exists, 1 otherwise.
    Check {
        /// Emit the report as JSON instead of the human-readable format
        #[arg(long)]
        json: bool,
    },
    /// Report configuration drift between manifests and the template
    Drift,
    /// Evaluate best-practice rules against every service
    Audit,
    /// Check documentation coverage for every service
    Docs,
    /// List discovered services per manifest
    Services,
    /// List referenced variables, their defaults, and declaration status
    Vars,
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Show version information
    Version {
        /// Include build commit information
        #[arg(long)]
        verbose: bool,
    },
}
