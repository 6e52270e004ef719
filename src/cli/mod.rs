//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `list`: List one table from configuration, plan and state files
//! - `init`: Create an example configuration file
//! - `validate`: Validate a configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Resources declared in the current directory (default "*.tf")
//! tfinspect list resource
//!
//! # Variables of a module tree, as a table
//! tfinspect list variable ./modules --format table
//!
//! # Resources of a plan export and a state file
//! tfinspect list resource --plan plan.json --state prod.tfstate
//!
//! # Initialize configuration
//! tfinspect init
//!
//! # Validate configuration
//! tfinspect validate tfinspect.yaml
//! ```

use crate::types::{OutputFormat, TableKind};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// tfinspect - typed rows from Terraform configuration, plan and state files.
#[derive(Parser, Debug)]
#[command(
    name = "tfinspect",
    author,
    version,
    about = "List Terraform configuration, plan and state files as typed rows",
    long_about = "tfinspect parses Terraform/OpenTofu configuration (.tf, .tf.json), plan exports \
                  and state files, and lists resources, data sources, modules, outputs, \
                  variables, providers and locals with the source lines they were declared on."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TFINSPECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List one table from the configured files
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Create an example configuration file
    Init,

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Table to list
    #[arg(value_enum)]
    pub table: TableKind,

    /// Configuration files, directories or glob patterns
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// Plan export files or glob patterns
    #[arg(long, value_name = "PATH")]
    pub plan: Vec<String>,

    /// State files or glob patterns
    #[arg(long, value_name = "PATH")]
    pub state: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "json", value_enum)]
    pub format: OutputFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Keep listing other files when one fails to read or parse
    #[arg(long)]
    pub continue_on_error: bool,

    /// Maximum depth when a path names a directory
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Patterns to exclude from discovery (glob patterns)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Print JSON on one line
    #[arg(long)]
    pub compact: bool,

    /// Disable colors in table output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE", default_value = "tfinspect.yaml")]
    pub config: PathBuf,
}
