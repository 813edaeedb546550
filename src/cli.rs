use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::EnvironmentMode;

#[derive(Parser)]
#[command(name = "patchctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Apply ordered patch sets and find out why a patch conflicts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (defaults to config.toml in the config directory)
    #[arg(long, global = true, env = "PATCHCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Patch catalog (TOML)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Working tree the patches apply to
    #[arg(short = 'C', long, global = true)]
    pub work_dir: Option<PathBuf>,

    /// Patch engine: git or patch
    #[arg(long, global = true)]
    pub engine: Option<String>,

    /// Deployment environment detection
    #[arg(long, value_enum, global = true)]
    pub environment: Option<EnvironmentMode>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply all required patches in catalog order
    Apply,

    /// Apply required patches, then the given optional patches
    ApplyOptional {
        /// Optional patch ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Revert patches, last applied first
    Revert {
        /// Patch ids to revert
        ids: Vec<String>,

        /// Revert every patch in the catalog
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },

    /// Show which patches are present in the working tree
    Status,

    /// Explain why a patch does not apply (reverts required patches)
    Analyze {
        /// Id of the failing patch
        id: String,

        /// Also compare against optional patches (managed instances only)
        #[arg(long)]
        optional: bool,

        /// Optional patches to compare against (comma-separated)
        #[arg(long, value_delimiter = ',', requires = "optional")]
        filter: Vec<String>,
    },

    /// Dry-run a set of patches together without touching the tree
    Check {
        /// Patch ids, applied in the given order
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
