//! # hera-cli: offline HERA tooling
//!
//! Checks the same rules the gateway enforces, without a database:
//!
//! - `smart-code`: smart code format checks
//! - `presets`: preset catalog linting and inspection
//! - `nav`: role-filtered navigation preview
//! - `pos`: POS checkout payload preview
//!
//! Handlers take their parsed arguments and an output sink and return
//! [`Outcome`]; `main` turns that into the process exit code.

pub mod nav;
pub mod pos;
pub mod presets;
pub mod smart_code;

use std::io::Read;
use std::path::Path;

use anyhow::Context;

/// Result of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything checked passed.
    Passed,
    /// The input was read but failed validation.
    Failed,
}

impl Outcome {
    /// Process exit code: 0 on pass, 1 on validation failure.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
        }
    }
}

/// Read a file, or stdin when the path is `-`.
pub(crate) fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
