//! Command-line interface definition for fnship
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for deploying functions, managing deployed functions,
//! and editing runtime config.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fnship - Deploy serverless functions and manage their runtime config
#[derive(Parser, Debug, Clone)]
#[command(name = "fnship")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "fnship.yaml")]
    pub config: Option<String>,

    /// Project to operate on (overrides config and FNSHIP_PROJECT)
    #[arg(short = 'P', long, global = true)]
    pub project: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for fnship
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Deploy functions declared in the manifest
    Deploy {
        /// Only deploy these targets, e.g. `functions:groupA.fn,functions:b`
        #[arg(long)]
        only: Option<String>,

        /// Skip these targets, e.g. `functions:legacy` or `functions`
        #[arg(long)]
        except: Option<String>,

        /// Declaration manifest (overrides functions.manifest)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Directory for packaging files (overrides deploy.output_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Location of the uploaded source archive
        #[arg(long)]
        source_archive_url: Option<String>,

        /// Print the release plan without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Inspect and delete deployed functions
    Functions {
        /// Functions subcommand
        #[command(subcommand)]
        command: FunctionsCommand,
    },

    /// Manage runtime config
    Config {
        /// Config subcommand
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Deployed function subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FunctionsCommand {
    /// List deployed functions
    List,

    /// Delete deployed functions matching dotted filters
    Delete {
        /// Function filters, e.g. `groupA` or `groupA.myFunc`
        #[arg(required = true)]
        filters: Vec<String>,

        /// Only delete functions in this region
        #[arg(short, long)]
        region: Option<String>,

        /// Delete without printing the list and stopping
        #[arg(short, long)]
        force: bool,
    },
}

/// Runtime config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print config, optionally at a dotted path
    Get {
        /// Dotted path such as `app.db.host`
        path: Option<String>,
    },

    /// Set config values from `key=value` pairs
    Set {
        /// `namespace.path=value` assignments
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Remove namespaces or keys
    Unset {
        /// Dotted keys; a bare namespace removes the whole namespace
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Copy config from another project
    Clone {
        /// Source project
        #[arg(long)]
        from: String,

        /// Comma-separated keys to copy
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Comma-separated keys to leave out
        #[arg(long, value_delimiter = ',')]
        except: Vec<String>,
    },

    /// Print config stored by older tooling, if any
    Legacy,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("fnship.yaml".to_string()),
            project: None,
            verbose: false,
            json_logs: false,
            command: Commands::Functions {
                command: FunctionsCommand::List,
            },
        }
    }
}
