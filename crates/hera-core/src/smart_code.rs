//! # Smart Codes
//!
//! A smart code is the dotted taxonomy tag attached to every entity,
//! dynamic field, relationship, transaction and transaction line:
//!
//! ```text
//! HERA.SALON.SALE.TXN.RETAIL.v1
//! ^^^^ ^^^^^ ^^^^^^^^^^^^^^^ ^^
//!  |     |         |          version: `v` + digits
//!  |     |         3 to 8 segments of [A-Z0-9_]
//!  |     domain: [A-Z0-9]+
//!  literal prefix
//! ```
//!
//! This is exactly the language of
//! `^HERA\.[A-Z0-9]+(\.[A-Z0-9_]+){3,8}\.v[0-9]+$`. Segments cannot contain
//! `.`, so splitting on dots yields the only possible parse and the check
//! is a single pass with no backtracking.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const PREFIX: &str = "HERA.";
const MIN_MIDDLE_SEGMENTS: usize = 3;
const MAX_MIDDLE_SEGMENTS: usize = 8;

/// Returns `true` iff `s` is a well-formed smart code.
pub fn is_valid_smart_code(s: &str) -> bool {
    check(s).is_ok()
}

/// A validated smart code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SmartCode(String);

impl SmartCode {
    /// Parse and validate a smart code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSmartCode`] naming the broken rule.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        check(&s).map_err(|reason| ValidationError::InvalidSmartCode {
            value: s.clone(),
            reason: reason.to_string(),
        })?;
        Ok(Self(s))
    }

    /// The full smart code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The domain segment (first segment after `HERA`), e.g. `SALON`.
    pub fn domain(&self) -> &str {
        self.parts().nth(1).unwrap_or_default()
    }

    /// The 3 to 8 segments between the domain and the version.
    pub fn segments(&self) -> Vec<&str> {
        let parts: Vec<&str> = self.parts().collect();
        parts[2..parts.len() - 1].to_vec()
    }

    /// The numeric version, e.g. `1` for `...v1`.
    ///
    /// Versions too large for `u32` saturate.
    pub fn version(&self) -> u32 {
        self.parts()
            .last()
            .and_then(|v| v.strip_prefix('v'))
            .map(|digits| digits.parse().unwrap_or(u32::MAX))
            .unwrap_or_default()
    }

    fn parts(&self) -> std::str::Split<'_, char> {
        self.0.split('.')
    }
}

impl fmt::Display for SmartCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SmartCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SmartCode> for String {
    fn from(code: SmartCode) -> Self {
        code.0
    }
}

impl AsRef<str> for SmartCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn check(s: &str) -> Result<(), &'static str> {
    let rest = s.strip_prefix(PREFIX).ok_or("must start with \"HERA.\"")?;
    let parts: Vec<&str> = rest.split('.').collect();

    // domain + middle segments + version
    if parts.len() < MIN_MIDDLE_SEGMENTS + 2 {
        return Err("expected 3 to 8 segments between the domain and the version");
    }
    if parts.len() > MAX_MIDDLE_SEGMENTS + 2 {
        return Err("expected 3 to 8 segments between the domain and the version");
    }

    let domain = parts[0];
    if domain.is_empty() || !domain.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
        return Err("domain segment must be non-empty uppercase alphanumeric");
    }

    for segment in &parts[1..parts.len() - 1] {
        if segment.is_empty()
            || !segment
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
        {
            return Err("segments must be non-empty uppercase alphanumeric or underscore");
        }
    }

    let version = parts[parts.len() - 1];
    match version.strip_prefix('v') {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        _ => Err("must end with a version segment like \".v1\""),
    }
}
