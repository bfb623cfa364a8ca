//! Dynamic field routes over `hera_dynamic_data_set_v1` / `_get_v1`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use hera_core::dynamic::validate_fields;
use hera_core::guardrail::require_organization_id;
use hera_core::{DynamicFieldInput, EntityId, GuardrailViolation, OrganizationId};
use hera_rpc_client::dynamic_data;
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::auth::{ensure_org_access, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{entity_id, extract_json, extract_query, Validate};
use crate::routes::{observe, require_client};
use crate::state::AppState;

/// Dynamic data routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/dynamic-data", post(set_dynamic_data).get(get_dynamic_data))
}

/// Body of `POST /dynamic-data`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DynamicDataBody {
    /// Owning organization.
    pub organization_id: Option<String>,
    /// Entity the fields belong to.
    #[serde(default)]
    pub entity_id: String,
    /// Entity type; when it names a preset the fields are checked against it.
    pub entity_type: Option<String>,
    /// Field values to upsert.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub fields: Vec<DynamicFieldInput>,
}

/// Checked dynamic data write.
#[derive(Debug)]
pub struct DynamicDataWrite {
    organization_id: OrganizationId,
    entity_id: EntityId,
    fields: Vec<DynamicFieldInput>,
}

impl Validate for DynamicDataBody {
    type Validated = DynamicDataWrite;

    fn validate(self) -> Result<DynamicDataWrite, GuardrailViolation> {
        let organization_id = require_organization_id(self.organization_id.as_deref())?;
        let entity_id = entity_id("entity_id", &self.entity_id)?;
        if self.fields.is_empty() {
            return Err(GuardrailViolation::Invalid(
                "fields must contain at least one field".into(),
            ));
        }
        validate_fields(&self.fields, "fields")?;
        Ok(DynamicDataWrite {
            organization_id,
            entity_id,
            fields: self.fields,
        })
    }
}

/// Query of `GET /dynamic-data`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DynamicDataQuery {
    /// Owning organization.
    pub organization_id: Option<String>,
    /// Entity to read.
    pub entity_id: Option<String>,
    /// Single field; all fields when absent.
    pub field_name: Option<String>,
}

/// POST /api/universal/dynamic-data: upsert field values on an entity.
#[utoipa::path(
    post,
    path = "/api/universal/dynamic-data",
    request_body = DynamicDataBody,
    responses(
        (status = 200, description = "Procedure result"),
        (status = 400, description = "Guardrail failure or procedure rejection", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "dynamic-data"
)]
pub async fn set_dynamic_data(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<DynamicDataBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let mut body = extract_json(body)?;
    let preset = body
        .entity_type
        .as_deref()
        .and_then(|t| state.registry.get(t.trim()));
    if let Some(preset) = preset {
        preset.complete_inputs(&mut body.fields);
    }
    let write = body.validate()?;
    if let Some(preset) = preset {
        preset.validate_dynamic_fields(&write.fields, false)?;
    }
    ensure_org_access(&caller, &write.organization_id)?;

    let client = require_client(&state)?;
    let result = client
        .dynamic_data()
        .set(&write.organization_id, &write.entity_id, &write.fields)
        .await;
    observe(&state.metrics, dynamic_data::SET, result).map(Json)
}

/// GET /api/universal/dynamic-data: read the field values of an entity.
#[utoipa::path(
    get,
    path = "/api/universal/dynamic-data",
    params(DynamicDataQuery),
    responses(
        (status = 200, description = "Procedure result"),
        (status = 400, description = "Missing or malformed ids", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "dynamic-data"
)]
pub async fn get_dynamic_data(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<DynamicDataQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let query = extract_query(query)?;
    let org = require_organization_id(query.organization_id.as_deref())?;
    let entity = entity_id("entity_id", query.entity_id.as_deref().unwrap_or_default())?;
    ensure_org_access(&caller, &org)?;

    let client = require_client(&state)?;
    let field_name = query.field_name.as_deref().filter(|f| !f.trim().is_empty());
    let result = client.dynamic_data().get(&org, &entity, field_name).await;
    observe(&state.metrics, dynamic_data::GET, result).map(Json)
}
