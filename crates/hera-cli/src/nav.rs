//! `hera nav` subcommand.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use hera_core::nav::navigation_from_path;
use hera_core::{default_navigation, filter_nav_by_role};

use crate::Outcome;

/// Arguments for the nav subcommand.
#[derive(Args, Debug)]
pub struct NavArgs {
    #[command(subcommand)]
    pub command: NavCommand,
}

#[derive(Subcommand, Debug)]
pub enum NavCommand {
    /// Print the navigation a caller with the given roles would see.
    Show {
        /// Comma-separated roles; all entries when omitted.
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
        /// Navigation YAML file; the builtin catalog when omitted.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

pub fn run_nav(args: &NavArgs, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    match &args.command {
        NavCommand::Show { roles, path } => {
            let items = match path {
                Some(path) => navigation_from_path(path)
                    .with_context(|| format!("failed to load navigation from {}", path.display()))?,
                None => default_navigation().context("builtin navigation is invalid")?,
            };
            let roles: Vec<&str> = roles
                .iter()
                .map(|r| r.trim())
                .filter(|r| !r.is_empty())
                .collect();
            let visible = if roles.is_empty() {
                items
            } else {
                filter_nav_by_role(&items, &roles)
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&visible)?)?;
            Ok(Outcome::Passed)
        }
    }
}
