//! Migrator CLI - apply pending migration files with an external client

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod logging;
mod output;

use commands::{status, up, SettingsArgs};

/// Migrator - apply pending database migrations, once each
#[derive(Parser)]
#[command(name = "migrator", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply all pending migrations (default)
    Up {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show applied, pending and ignored migrations
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Up { json: false }) {
        Commands::Up { json } => up::run(&cli.settings, json),
        Commands::Status { json } => status::run(&cli.settings, json),
    }
}
