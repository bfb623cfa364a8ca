//! `hera smart-code` subcommand.

use std::io::Write;

use clap::{Args, Subcommand};
use hera_core::{SmartCode, ValidationError};

use crate::Outcome;

/// Arguments for the smart-code subcommand.
#[derive(Args, Debug)]
pub struct SmartCodeArgs {
    #[command(subcommand)]
    pub command: SmartCodeCommand,
}

#[derive(Subcommand, Debug)]
pub enum SmartCodeCommand {
    /// Check one or more smart codes.
    Validate {
        /// Codes to check, e.g. HERA.SALON.SALE.TXN.RETAIL.v1
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

pub fn run_smart_code(args: &SmartCodeArgs, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    match &args.command {
        SmartCodeCommand::Validate { codes } => validate(codes, out),
    }
}

fn validate(codes: &[String], out: &mut dyn Write) -> anyhow::Result<Outcome> {
    let mut outcome = Outcome::Passed;
    for code in codes {
        match SmartCode::parse(code.as_str()) {
            Ok(parsed) => writeln!(out, "{code}: ok (domain {}, v{})", parsed.domain(), parsed.version())?,
            Err(err) => {
                outcome = Outcome::Failed;
                let reason = match err {
                    ValidationError::InvalidSmartCode { reason, .. } => reason,
                    other => other.to_string(),
                };
                writeln!(out, "{code}: invalid: {reason}")?;
            }
        }
    }
    Ok(outcome)
}
