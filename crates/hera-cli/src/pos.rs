//! `hera pos` subcommand: preview the transaction a checkout would emit.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use hera_core::{build_pos_emit_payload, PosSale};

use crate::{read_input, Outcome};

/// Arguments for the pos subcommand.
#[derive(Args, Debug)]
pub struct PosArgs {
    #[command(subcommand)]
    pub command: PosCommand,
}

#[derive(Subcommand, Debug)]
pub enum PosCommand {
    /// Build the emit payload for a sale read from a JSON file (`-` for stdin).
    Payload {
        file: PathBuf,
    },
}

pub fn run_pos(args: &PosArgs, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    match &args.command {
        PosCommand::Payload { file } => {
            let raw = read_input(file)?;
            let sale: PosSale = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a valid POS sale", file.display()))?;
            match build_pos_emit_payload(&sale) {
                Ok(payload) => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
                    Ok(Outcome::Passed)
                }
                Err(err) => {
                    tracing::debug!(error = %err, "sale rejected");
                    writeln!(out, "rejected: {err}")?;
                    Ok(Outcome::Failed)
                }
            }
        }
    }
}
