//! Typed client for the relationship procedures.

use chrono::{DateTime, Utc};
use hera_core::{EntityId, OrganizationId, SmartCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::RpcError;
use crate::Rpc;

pub const UPSERT: &str = "hera_relationship_upsert_v1";
pub const UPSERT_BATCH: &str = "hera_relationship_upsert_batch_v1";

/// A validated relationship between two entities.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipUpsert {
    /// Source entity.
    pub from_entity_id: EntityId,
    /// Target entity.
    pub to_entity_id: EntityId,
    /// Relationship type, e.g. `HAS_CATEGORY`.
    pub relationship_type: String,
    /// Relationship smart code.
    pub smart_code: SmartCode,
    /// Direction hint, e.g. `forward`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_direction: Option<String>,
    /// Payload stored on the relationship row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_data: Option<Value>,
    /// Start of validity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<DateTime<Utc>>,
    /// End of validity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct UpsertParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_from_entity_id: &'a EntityId,
    p_to_entity_id: &'a EntityId,
    p_relationship_type: &'a str,
    p_smart_code: &'a SmartCode,
    p_relationship_direction: Option<&'a str>,
    p_relationship_data: Option<&'a Value>,
    p_effective_date: Option<&'a DateTime<Utc>>,
    p_expiration_date: Option<&'a DateTime<Utc>>,
}

#[derive(Serialize)]
struct BatchParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_rows: &'a [RelationshipUpsert],
}

/// Client for the relationship procedures.
#[derive(Debug, Clone)]
pub struct RelationshipClient {
    rpc: Rpc,
}

impl RelationshipClient {
    pub(crate) fn new(rpc: Rpc) -> Self {
        Self { rpc }
    }

    /// Create or update one relationship.
    pub async fn upsert(
        &self,
        org: &OrganizationId,
        rel: &RelationshipUpsert,
    ) -> Result<Value, RpcError> {
        let params = UpsertParams {
            p_organization_id: org,
            p_from_entity_id: &rel.from_entity_id,
            p_to_entity_id: &rel.to_entity_id,
            p_relationship_type: &rel.relationship_type,
            p_smart_code: &rel.smart_code,
            p_relationship_direction: rel.relationship_direction.as_deref(),
            p_relationship_data: rel.relationship_data.as_ref(),
            p_effective_date: rel.effective_date.as_ref(),
            p_expiration_date: rel.expiration_date.as_ref(),
        };
        self.rpc.call(UPSERT, &params).await
    }

    /// Create or update many relationships in one database transaction.
    pub async fn upsert_batch(
        &self,
        org: &OrganizationId,
        rows: &[RelationshipUpsert],
    ) -> Result<Value, RpcError> {
        let params = BatchParams {
            p_organization_id: org,
            p_rows: rows,
        };
        self.rpc.call(UPSERT_BATCH, &params).await
    }
}
