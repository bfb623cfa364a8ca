//! Typed client for the dynamic data procedures.

use hera_core::dynamic::fields_to_rpc;
use hera_core::{DynamicFieldInput, EntityId, OrganizationId};
use serde::Serialize;
use serde_json::Value;

use crate::error::RpcError;
use crate::Rpc;

pub const SET: &str = "hera_dynamic_data_set_v1";
pub const GET: &str = "hera_dynamic_data_get_v1";

#[derive(Serialize)]
struct SetParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_entity_id: &'a EntityId,
    p_fields: Value,
}

#[derive(Serialize)]
struct GetParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_entity_id: &'a EntityId,
    p_field_name: Option<&'a str>,
}

/// Client for the dynamic data procedures.
#[derive(Debug, Clone)]
pub struct DynamicDataClient {
    rpc: Rpc,
}

impl DynamicDataClient {
    pub(crate) fn new(rpc: Rpc) -> Self {
        Self { rpc }
    }

    /// Upsert field values on an entity.
    pub async fn set(
        &self,
        org: &OrganizationId,
        entity_id: &EntityId,
        fields: &[DynamicFieldInput],
    ) -> Result<Value, RpcError> {
        let params = SetParams {
            p_organization_id: org,
            p_entity_id: entity_id,
            p_fields: fields_to_rpc(fields),
        };
        self.rpc.call(SET, &params).await
    }

    /// Read field values; all fields when `field_name` is `None`.
    pub async fn get(
        &self,
        org: &OrganizationId,
        entity_id: &EntityId,
        field_name: Option<&str>,
    ) -> Result<Value, RpcError> {
        let params = GetParams {
            p_organization_id: org,
            p_entity_id: entity_id,
            p_field_name: field_name,
        };
        self.rpc.call(GET, &params).await
    }
}
