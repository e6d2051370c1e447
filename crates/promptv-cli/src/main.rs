//! promptv CLI - local version control for LLM prompts
//!
//! This is the command-line interface for promptv. It provides a thin layer
//! over the core library: argument parsing, config, and output formatting.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::{exit_code_for, hint_for, AppContext};
use crate::cli::{Cli, Commands};

/// Log to stderr. `PROMPTV_LOG` takes a full filter; otherwise `--verbose`
/// selects debug and the default is warnings only.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PROMPTV_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "promptv_core=debug,promptv=debug"
        } else {
            "warn"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Commands::Init(args) = &cli.command {
        return commands::init::handle_init(cli, args);
    }

    let ctx = AppContext::open(cli)?;
    match &cli.command {
        Commands::Init(_) => Ok(()),
        Commands::Commit(args) => commands::prompts::handle_commit(cli, &ctx, args),
        Commands::Get(args) => commands::prompts::handle_get(cli, &ctx, args),
        Commands::List(args) => commands::prompts::handle_list(cli, &ctx, args),
        Commands::Remove(args) => commands::prompts::handle_remove(cli, &ctx, args),
        Commands::Tag(command) => commands::tags::handle_tag(cli, &ctx, command),
        Commands::Diff(args) => commands::diff::handle_diff(cli, &ctx, args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("Error: {:#}", err);
        if let Some(hint) = hint_for(&err) {
            eprintln!("{}", hint);
        }
        std::process::exit(exit_code_for(&err));
    }
}
