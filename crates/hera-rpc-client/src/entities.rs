//! Typed client for the entity procedures.
//!
//! | Function | Operation |
//! |----------|-----------|
//! | `hera_entity_upsert_v1` | Create or update an entity with its dynamic fields |
//! | `hera_entity_read_v1` | Read one entity (id given) or list entities |
//! | `hera_entity_delete_v1` | Soft delete, or hard delete when requested |

use hera_core::dynamic::fields_to_rpc;
use hera_core::{DynamicFieldInput, EntityId, OrganizationId, SmartCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::RpcError;
use crate::Rpc;

pub const UPSERT: &str = "hera_entity_upsert_v1";
pub const READ: &str = "hera_entity_read_v1";
pub const DELETE: &str = "hera_entity_delete_v1";

/// A validated entity create or update.
#[derive(Debug, Clone)]
pub struct EntityUpsert {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Entity type, e.g. `CUSTOMER`.
    pub entity_type: String,
    /// Display name.
    pub entity_name: String,
    /// Entity smart code.
    pub smart_code: SmartCode,
    /// Present for updates.
    pub entity_id: Option<EntityId>,
    /// Business code, e.g. a SKU.
    pub entity_code: Option<String>,
    /// Parent entity in a hierarchy.
    pub parent_entity_id: Option<EntityId>,
    /// Lifecycle status.
    pub status: Option<String>,
    /// Free-form metadata.
    pub metadata: Option<Value>,
    /// Dynamic field values.
    pub dynamic_fields: Vec<DynamicFieldInput>,
}

#[derive(Serialize)]
struct UpsertParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_entity_type: &'a str,
    p_entity_name: &'a str,
    p_smart_code: &'a SmartCode,
    p_entity_id: Option<&'a EntityId>,
    p_entity_code: Option<&'a str>,
    p_parent_entity_id: Option<&'a EntityId>,
    p_status: Option<&'a str>,
    p_metadata: Option<&'a Value>,
    p_dynamic: Value,
}

/// Filter for entity reads.
#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    /// Single entity; `None` lists.
    pub entity_id: Option<EntityId>,
    /// Restrict the listing to one type.
    pub entity_type: Option<String>,
    /// Include dynamic field values.
    pub include_dynamic: bool,
    /// Include relationships.
    pub include_relationships: bool,
    /// Page size.
    pub limit: Option<u32>,
    /// Page offset.
    pub offset: Option<u32>,
}

#[derive(Serialize)]
struct ReadParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_entity_id: Option<&'a EntityId>,
    p_entity_type: Option<&'a str>,
    p_include_dynamic: bool,
    p_include_relationships: bool,
    p_limit: Option<u32>,
    p_offset: Option<u32>,
}

#[derive(Serialize)]
struct DeleteParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_entity_id: &'a EntityId,
    p_hard_delete: bool,
}

/// Client for the entity procedures.
#[derive(Debug, Clone)]
pub struct EntityClient {
    rpc: Rpc,
}

impl EntityClient {
    pub(crate) fn new(rpc: Rpc) -> Self {
        Self { rpc }
    }

    /// Create or update an entity.
    pub async fn upsert(&self, req: &EntityUpsert) -> Result<Value, RpcError> {
        let params = UpsertParams {
            p_organization_id: &req.organization_id,
            p_entity_type: &req.entity_type,
            p_entity_name: &req.entity_name,
            p_smart_code: &req.smart_code,
            p_entity_id: req.entity_id.as_ref(),
            p_entity_code: req.entity_code.as_deref(),
            p_parent_entity_id: req.parent_entity_id.as_ref(),
            p_status: req.status.as_deref(),
            p_metadata: req.metadata.as_ref(),
            p_dynamic: fields_to_rpc(&req.dynamic_fields),
        };
        self.rpc.call(UPSERT, &params).await
    }

    /// Read one entity or a page of entities.
    pub async fn read(&self, org: &OrganizationId, query: &EntityQuery) -> Result<Value, RpcError> {
        let params = ReadParams {
            p_organization_id: org,
            p_entity_id: query.entity_id.as_ref(),
            p_entity_type: query.entity_type.as_deref(),
            p_include_dynamic: query.include_dynamic,
            p_include_relationships: query.include_relationships,
            p_limit: query.limit,
            p_offset: query.offset,
        };
        self.rpc.call(READ, &params).await
    }

    /// Read a single entity with its dynamic fields and relationships.
    ///
    /// Returns `Ok(None)` when the procedure returns nothing for the id.
    pub async fn get(&self, org: &OrganizationId, id: &EntityId) -> Result<Option<Value>, RpcError> {
        let query = EntityQuery {
            entity_id: Some(*id),
            include_dynamic: true,
            include_relationships: true,
            ..EntityQuery::default()
        };
        let value = self.read(org, &query).await?;
        Ok(first_row(value))
    }

    /// Delete an entity.
    pub async fn delete(
        &self,
        org: &OrganizationId,
        id: &EntityId,
        hard_delete: bool,
    ) -> Result<Value, RpcError> {
        let params = DeleteParams {
            p_organization_id: org,
            p_entity_id: id,
            p_hard_delete: hard_delete,
        };
        self.rpc.call(DELETE, &params).await
    }
}

/// Unwrap the common single-row result shapes: `null`, `[]`, `[row]`,
/// `{data: row}` or a bare object.
pub(crate) fn first_row(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(mut rows) => {
            if rows.is_empty() {
                None
            } else {
                Some(rows.swap_remove(0))
            }
        }
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Null) => None,
            Some(data @ Value::Array(_)) => first_row(data),
            Some(data) => Some(data),
            None => Some(Value::Object(obj)),
        },
        other => Some(other),
    }
}
