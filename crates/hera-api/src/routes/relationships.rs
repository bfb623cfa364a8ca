//! # Relationship Routes
//!
//! `POST /relationships` takes either one relationship or a batch:
//!
//! ```json
//! { "organization_id": "...", "from_entity_id": "...", "to_entity_id": "...", ... }
//! { "organization_id": "...", "relationships": [ { ... }, { ... } ] }
//! ```
//!
//! Batch items may repeat `organization_id`; when they do it must match the
//! batch's.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use hera_core::guardrail::{ensure_same_organization, require_non_empty, require_organization_id, require_smart_code};
use hera_core::{GuardrailViolation, OrganizationId};
use hera_rpc_client::relationships::{self, RelationshipUpsert};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::{ensure_org_access, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{entity_id, extract_json, from_body};
use crate::routes::{observe, require_client};
use crate::state::AppState;

/// Relationship routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/relationships", post(upsert_relationships))
}

/// One relationship as submitted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RelationshipInput {
    /// Owning organization; required on single requests.
    pub organization_id: Option<String>,
    /// Source entity (UUID).
    #[serde(default)]
    pub from_entity_id: String,
    /// Target entity (UUID).
    #[serde(default)]
    pub to_entity_id: String,
    /// Relationship type, e.g. `HAS_CATEGORY`.
    #[serde(default)]
    pub relationship_type: String,
    /// Relationship smart code.
    #[serde(default)]
    pub smart_code: String,
    /// Direction hint.
    pub relationship_direction: Option<String>,
    /// Payload stored on the relationship.
    #[schema(value_type = Option<Object>)]
    pub relationship_data: Option<Value>,
    /// Start of validity.
    pub effective_date: Option<DateTime<Utc>>,
    /// End of validity.
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Batch form of `POST /relationships`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RelationshipBatchBody {
    /// Organization of every item.
    pub organization_id: Option<String>,
    /// Relationships to upsert atomically.
    pub relationships: Vec<RelationshipInput>,
}

impl RelationshipInput {
    fn into_upsert(self, path: &str) -> Result<RelationshipUpsert, GuardrailViolation> {
        let from_entity_id = entity_id(&format!("{path}from_entity_id"), &self.from_entity_id)?;
        let to_entity_id = entity_id(&format!("{path}to_entity_id"), &self.to_entity_id)?;
        require_non_empty(&format!("{path}relationship_type"), &self.relationship_type)?;
        let smart_code = require_smart_code(&format!("{path}smart_code"), &self.smart_code)?;
        if let (Some(start), Some(end)) = (self.effective_date, self.expiration_date) {
            if end < start {
                return Err(GuardrailViolation::Invalid(format!(
                    "{path}expiration_date precedes effective_date"
                )));
            }
        }
        Ok(RelationshipUpsert {
            from_entity_id,
            to_entity_id,
            relationship_type: self.relationship_type.trim().to_ascii_uppercase(),
            smart_code,
            relationship_direction: self.relationship_direction,
            relationship_data: self.relationship_data,
            effective_date: self.effective_date,
            expiration_date: self.expiration_date,
        })
    }
}

/// A checked relationship request.
#[derive(Debug)]
enum RelationshipWrite {
    Single(OrganizationId, RelationshipUpsert),
    Batch(OrganizationId, Vec<RelationshipUpsert>),
}

fn check_single(input: RelationshipInput) -> Result<RelationshipWrite, GuardrailViolation> {
    let org = require_organization_id(input.organization_id.as_deref())?;
    Ok(RelationshipWrite::Single(org, input.into_upsert("")?))
}

fn check_batch(batch: RelationshipBatchBody) -> Result<RelationshipWrite, GuardrailViolation> {
    let org = require_organization_id(batch.organization_id.as_deref())?;
    if batch.relationships.is_empty() {
        return Err(GuardrailViolation::Invalid(
            "relationships must contain at least one relationship".into(),
        ));
    }
    let mut rows = Vec::with_capacity(batch.relationships.len());
    for (i, item) in batch.relationships.into_iter().enumerate() {
        let path = format!("relationships[{i}].");
        let item_org = item
            .organization_id
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .map(|o| require_organization_id(Some(o)))
            .transpose()?;
        ensure_same_organization(&format!("{path}organization_id"), &org, item_org.as_ref())?;
        rows.push(item.into_upsert(&path)?);
    }
    Ok(RelationshipWrite::Batch(org, rows))
}

/// POST /api/universal/relationships: upsert one relationship or a batch.
#[utoipa::path(
    post,
    path = "/api/universal/relationships",
    request_body(content = RelationshipInput, description = "A relationship, or a RelationshipBatchBody"),
    responses(
        (status = 200, description = "Procedure result"),
        (status = 400, description = "Guardrail failure or procedure rejection", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "relationships"
)]
pub async fn upsert_relationships(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let body = extract_json(body)?;
    let write = if body.get("relationships").is_some() {
        check_batch(from_body(body)?)?
    } else {
        check_single(from_body(body)?)?
    };

    match write {
        RelationshipWrite::Single(org, row) => {
            ensure_org_access(&caller, &org)?;
            let client = require_client(&state)?;
            let result = client.relationships().upsert(&org, &row).await;
            observe(&state.metrics, relationships::UPSERT, result).map(Json)
        }
        RelationshipWrite::Batch(org, rows) => {
            ensure_org_access(&caller, &org)?;
            let client = require_client(&state)?;
            tracing::debug!(organization_id = %org, count = rows.len(), "forwarding relationship batch");
            let result = client.relationships().upsert_batch(&org, &rows).await;
            observe(&state.metrics, relationships::UPSERT_BATCH, result).map(Json)
        }
    }
}
