//! `hera presets` subcommand: lint and inspect preset catalogs.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use hera_core::PresetRegistry;

use crate::Outcome;

/// Arguments for the presets subcommand.
#[derive(Args, Debug)]
pub struct PresetsArgs {
    #[command(subcommand)]
    pub command: PresetsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PresetsCommand {
    /// Load a catalog and report each resolved preset.
    Lint {
        /// Preset YAML file; the builtin catalog when omitted.
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print one resolved preset as JSON.
    Show {
        /// Entity type, case-insensitive.
        entity_type: String,
        /// Preset YAML file; the builtin catalog when omitted.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

pub fn run_presets(args: &PresetsArgs, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    match &args.command {
        PresetsCommand::Lint { path } => lint(path.as_deref(), out),
        PresetsCommand::Show { entity_type, path } => {
            let registry = load(path.as_deref())?;
            match registry.get(entity_type) {
                Some(preset) => {
                    writeln!(out, "{}", serde_json::to_string_pretty(preset)?)?;
                    Ok(Outcome::Passed)
                }
                None => {
                    writeln!(out, "no preset for entity type {entity_type}")?;
                    Ok(Outcome::Failed)
                }
            }
        }
    }
}

fn load(path: Option<&Path>) -> anyhow::Result<PresetRegistry> {
    match path {
        Some(path) => PresetRegistry::from_path(path)
            .with_context(|| format!("failed to load presets from {}", path.display())),
        None => PresetRegistry::builtin().context("builtin preset catalog is invalid"),
    }
}

/// A catalog that fails to load is a lint failure, not an I/O error, unless
/// the file could not be read at all.
fn lint(path: Option<&Path>, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    let registry = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("{} does not exist", path.display());
            }
            match PresetRegistry::from_path(path) {
                Ok(registry) => registry,
                Err(err) => {
                    writeln!(out, "error: {err}")?;
                    return Ok(Outcome::Failed);
                }
            }
        }
        None => load(None)?,
    };

    for preset in registry.list() {
        let required: Vec<&str> = preset.required_fields().collect();
        writeln!(
            out,
            "{:<12} {} fields, {} relationships, required [{}]  {}",
            preset.entity_type,
            preset.dynamic_fields.len(),
            preset.relationships.len(),
            required.join(", "),
            preset.smart_code,
        )?;
    }
    writeln!(out, "{} presets ok", registry.len())?;
    Ok(Outcome::Passed)
}
