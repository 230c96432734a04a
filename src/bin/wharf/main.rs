//! Wharf CLI - dependency discovery and legacy configuration import for Go

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use wharf::util::{GlobalContext, Shell};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("wharf=debug")
    } else {
        EnvFilter::new("wharf=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(cli.quiet, cli.verbose, !cli.no_color);
    let ctx = GlobalContext::new()?.with_shell(shell);

    match cli.command {
        Commands::Init(args) => commands::init::execute(args, ctx),
        Commands::HashInputs(args) => commands::hash_inputs::execute(args, ctx),
    }
}
