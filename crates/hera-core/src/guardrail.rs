//! # Guardrails
//!
//! Single-pass request checks run before anything is forwarded to the
//! database. A request that fails here never reaches an RPC.
//!
//! The checks are deliberately shallow: presence, UUID shape, smart-code
//! format, and organization consistency inside batches. Everything that
//! requires data (does the entity exist, is the period open) is enforced by
//! the stored procedures.

use crate::error::GuardrailViolation;
use crate::identity::OrganizationId;
use crate::smart_code::SmartCode;

/// Require a present, well-formed organization identifier.
pub fn require_organization_id(raw: Option<&str>) -> Result<OrganizationId, GuardrailViolation> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(GuardrailViolation::MissingOrganization);
    }
    OrganizationId::parse(raw).map_err(|_| GuardrailViolation::MalformedOrganization(raw.to_string()))
}

/// Validate the smart code in `field`.
pub fn require_smart_code(field: &str, raw: &str) -> Result<SmartCode, GuardrailViolation> {
    SmartCode::parse(raw).map_err(|source| GuardrailViolation::SmartCode {
        field: field.to_string(),
        source,
    })
}

/// Validate an optional smart code; absent is fine.
pub fn optional_smart_code(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<SmartCode>, GuardrailViolation> {
    raw.map(|r| require_smart_code(field, r)).transpose()
}

/// Require a non-blank string field.
pub fn require_non_empty(field: &str, raw: &str) -> Result<(), GuardrailViolation> {
    if raw.trim().is_empty() {
        Err(GuardrailViolation::EmptyField(field.to_string()))
    } else {
        Ok(())
    }
}

/// Check that a batch item, if it names an organization, names the batch's.
pub fn ensure_same_organization(
    field: &str,
    expected: &OrganizationId,
    actual: Option<&OrganizationId>,
) -> Result<(), GuardrailViolation> {
    match actual {
        Some(actual) if actual != expected => Err(GuardrailViolation::OrganizationMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORG: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn missing_organization_rejected() {
        assert_eq!(
            require_organization_id(None).unwrap_err(),
            GuardrailViolation::MissingOrganization
        );
        assert_eq!(
            require_organization_id(Some("   ")).unwrap_err(),
            GuardrailViolation::MissingOrganization
        );
    }

    #[test]
    fn malformed_organization_rejected() {
        let err = require_organization_id(Some("acme")).unwrap_err();
        assert_eq!(err, GuardrailViolation::MalformedOrganization("acme".into()));
    }

    #[test]
    fn valid_organization_accepted() {
        let org = require_organization_id(Some(ORG)).unwrap();
        assert_eq!(org.to_string(), ORG);
    }

    #[test]
    fn smart_code_error_carries_field() {
        let err = require_smart_code("smart_code", "HERA.BAD").unwrap_err();
        match err {
            GuardrailViolation::SmartCode { field, .. } => assert_eq!(field, "smart_code"),
            other => panic!("expected SmartCode, got {other:?}"),
        }
    }

    #[test]
    fn optional_smart_code_allows_absent() {
        assert_eq!(optional_smart_code("x", None).unwrap(), None);
        assert!(optional_smart_code("x", Some("nope")).is_err());
    }

    #[test]
    fn blank_field_rejected() {
        assert_eq!(
            require_non_empty("entity_name", " \t").unwrap_err(),
            GuardrailViolation::EmptyField("entity_name".into())
        );
        assert!(require_non_empty("entity_name", "Jane").is_ok());
    }

    #[test]
    fn batch_organization_mismatch_detected() {
        let expected = OrganizationId::parse(ORG).unwrap();
        let other = OrganizationId::new();
        assert!(ensure_same_organization("items[0]", &expected, None).is_ok());
        assert!(ensure_same_organization("items[0]", &expected, Some(&expected)).is_ok());
        assert!(matches!(
            ensure_same_organization("items[1]", &expected, Some(&other)),
            Err(GuardrailViolation::OrganizationMismatch { .. })
        ));
    }
}
