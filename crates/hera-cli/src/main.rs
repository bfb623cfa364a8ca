//! # hera CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Exit codes: 0 success, 1 validation failure, 2 usage or I/O error.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hera_cli::nav::{run_nav, NavArgs};
use hera_cli::pos::{run_pos, PosArgs};
use hera_cli::presets::{run_presets, PresetsArgs};
use hera_cli::smart_code::{run_smart_code, SmartCodeArgs};

/// HERA offline tooling.
///
/// Checks smart codes, lints preset catalogs, previews role-filtered
/// navigation and POS checkout payloads. Never talks to the database.
#[derive(Parser, Debug)]
#[command(name = "hera", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Smart code format checks.
    SmartCode(SmartCodeArgs),

    /// Lint and inspect preset catalogs.
    Presets(PresetsArgs),

    /// Preview the navigation a set of roles would see.
    Nav(NavArgs),

    /// Preview the transaction a POS checkout would emit.
    Pos(PosArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::SmartCode(args) => run_smart_code(args, &mut stdout),
        Commands::Presets(args) => run_presets(args, &mut stdout),
        Commands::Nav(args) => run_nav(args, &mut stdout),
        Commands::Pos(args) => run_pos(args, &mut stdout),
    };

    match result {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
