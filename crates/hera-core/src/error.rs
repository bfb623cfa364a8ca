//! # Error Hierarchy
//!
//! Structured error types for the gateway's local checks, built with
//! `thiserror`. Each variant carries the offending input so a 400 response
//! tells the caller exactly what to fix.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Smart code does not match `HERA.<SEGMENT>(.<SEGMENT>){3,8}.v<digits>`.
    #[error("invalid smart code \"{value}\": {reason}")]
    InvalidSmartCode {
        /// The rejected input.
        value: String,
        /// Which rule the input broke.
        reason: String,
    },

    /// Identifier is not a UUID.
    #[error("invalid {kind} \"{value}\": expected a UUID")]
    InvalidUuid {
        /// Identifier kind, e.g. `organization_id`.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// A request failed one of the per-request guardrail checks.
///
/// Guardrail violations always map to HTTP 400: the request is malformed
/// and retrying it unchanged will fail again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardrailViolation {
    /// The request carries no organization identifier.
    #[error("organization_id is required")]
    MissingOrganization,

    /// The organization identifier is present but not a UUID.
    #[error("organization_id must be a UUID (got \"{0}\")")]
    MalformedOrganization(String),

    /// A smart-code-bearing field failed format validation.
    #[error("{field}: {source}")]
    SmartCode {
        /// JSON path of the offending field, e.g. `lines[2].smart_code`.
        field: String,
        /// Underlying format error.
        source: ValidationError,
    },

    /// A required string field is missing or blank.
    #[error("{0} must not be empty")]
    EmptyField(String),

    /// A batch item names a different organization than the batch.
    #[error("{field} belongs to organization {actual}, expected {expected}")]
    OrganizationMismatch {
        /// JSON path of the offending item.
        field: String,
        /// Organization of the enclosing request.
        expected: String,
        /// Organization named by the item.
        actual: String,
    },

    /// Any other structural rule (duplicate line numbers, empty batches, ...).
    #[error("{0}")]
    Invalid(String),
}

/// Errors raised while loading or applying entity presets.
#[derive(Error, Debug)]
pub enum PresetError {
    /// YAML document could not be parsed.
    #[error("failed to parse preset document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Preset file could not be read.
    #[error("failed to read preset file {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A smart code inside the document is malformed.
    #[error("{path}: {source}")]
    SmartCode {
        /// Location inside the document, e.g. `presets[CUSTOMER].dynamic_fields[email]`.
        path: String,
        /// Underlying format error.
        source: ValidationError,
    },

    /// A preset references a mixin that the document does not define.
    #[error("preset {entity_type} references unknown mixin {mixin}")]
    UnknownMixin {
        /// Entity type of the referencing preset.
        entity_type: String,
        /// Missing mixin name.
        mixin: String,
    },

    /// An overlay targets an entity type with no base preset.
    #[error("overlay targets unknown entity type {0}")]
    UnknownOverlayTarget(String),

    /// Two presets declare the same entity type.
    #[error("duplicate preset for entity type {0}")]
    Duplicate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_code_error_names_value_and_reason() {
        let err = ValidationError::InvalidSmartCode {
            value: "HERA.X".into(),
            reason: "too few segments".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HERA.X"));
        assert!(msg.contains("too few segments"));
    }

    #[test]
    fn guardrail_smart_code_prefixes_field_path() {
        let err = GuardrailViolation::SmartCode {
            field: "lines[0].smart_code".into(),
            source: ValidationError::InvalidSmartCode {
                value: "bad".into(),
                reason: "must start with HERA.".into(),
            },
        };
        assert!(err.to_string().starts_with("lines[0].smart_code: "));
    }

    #[test]
    fn missing_organization_message_matches_contract() {
        assert_eq!(
            GuardrailViolation::MissingOrganization.to_string(),
            "organization_id is required"
        );
    }

    #[test]
    fn organization_mismatch_names_both_sides() {
        let err = GuardrailViolation::OrganizationMismatch {
            field: "relationships[1]".into(),
            expected: "a".into(),
            actual: "b".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("relationships[1]"));
        assert!(msg.contains("expected a"));
    }

    #[test]
    fn preset_unknown_mixin_display() {
        let err = PresetError::UnknownMixin {
            entity_type: "CUSTOMER".into(),
            mixin: "loyalty".into(),
        };
        assert!(err.to_string().contains("loyalty"));
    }
}
