//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Wharf - dependency discovery and legacy configuration import for Go
#[derive(Parser)]
#[command(name = "wharf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write Wharf.toml and Wharf.lock for an existing project
    Init(InitArgs),

    /// Print the hash of the current project's solve inputs
    HashInputs(HashInputsArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Project directory (defaults to current directory)
    pub path: Option<PathBuf>,

    /// Import path of the project, when it is not under a search root
    #[arg(long, value_name = "IMPORT_PATH")]
    pub root: Option<String>,

    /// Do not import configuration from glide, godep, govend or govendor
    #[arg(long)]
    pub skip_tools: bool,

    /// Do not fetch sources over the network
    #[arg(long, env = "WHARF_OFFLINE")]
    pub offline: bool,
}

#[derive(Args)]
pub struct HashInputsArgs {
    /// Import path of the project, when it is not under a search root
    #[arg(long, value_name = "IMPORT_PATH")]
    pub root: Option<String>,
}
