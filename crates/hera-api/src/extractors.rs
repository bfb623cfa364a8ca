//! # Request Extraction & Guardrails
//!
//! Helpers that turn axum rejections into `400` responses with the flat
//! error body, and the [`Validate`] trait that request DTOs implement to
//! turn a raw body into typed, guardrail-checked values.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use hera_core::{EntityId, GuardrailViolation, TransactionId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;

/// Request DTOs that check their guardrails on the way to a typed value.
pub trait Validate {
    /// The checked form handed to the RPC layer.
    type Validated;

    /// Run the guardrail checks.
    fn validate(self) -> Result<Self::Validated, GuardrailViolation>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract query parameters, mapping failures to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Deserialize one shape out of an already-parsed JSON body.
pub fn from_body<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Failed to deserialize the JSON body: {e}")))
}

/// `?organization_id=` for reads and deletes.
#[derive(Debug, Default, Deserialize)]
pub struct OrgQuery {
    /// Organization the request acts on.
    pub organization_id: Option<String>,
}

/// Parse an entity id, naming `field` in the error.
pub fn entity_id(field: &str, raw: &str) -> Result<EntityId, GuardrailViolation> {
    EntityId::parse(raw.trim())
        .map_err(|_| GuardrailViolation::Invalid(format!("{field} must be a UUID (got \"{raw}\")")))
}

/// Parse an optional entity id; blank counts as absent.
pub fn optional_entity_id(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<EntityId>, GuardrailViolation> {
    raw.filter(|r| !r.trim().is_empty())
        .map(|r| entity_id(field, r))
        .transpose()
}

/// Parse a transaction id, naming `field` in the error.
pub fn transaction_id(field: &str, raw: &str) -> Result<TransactionId, GuardrailViolation> {
    TransactionId::parse(raw.trim())
        .map_err(|_| GuardrailViolation::Invalid(format!("{field} must be a UUID (got \"{raw}\")")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_name_the_field() {
        let err = entity_id("entity_id", "p1").unwrap_err();
        assert_eq!(err.to_string(), "entity_id must be a UUID (got \"p1\")");
        assert!(entity_id("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
    }

    #[test]
    fn blank_optional_id_is_absent() {
        assert_eq!(optional_entity_id("parent_entity_id", Some("  ")).unwrap(), None);
        assert_eq!(optional_entity_id("parent_entity_id", None).unwrap(), None);
        assert!(optional_entity_id("parent_entity_id", Some("x")).is_err());
    }

    #[test]
    fn from_body_maps_to_bad_request() {
        let err = from_body::<OrgQuery>(serde_json::json!({"organization_id": 5})).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.contains("organization_id")));
    }
}
