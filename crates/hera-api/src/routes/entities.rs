//! # Entity Routes
//!
//! Create/update, read, list and delete entities through the
//! `hera_entity_*_v1` procedures. When a preset exists for the entity type,
//! submitted dynamic fields are completed from it (type, smart code) and
//! type-checked against it before the upsert is forwarded.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use hera_core::dynamic::validate_fields;
use hera_core::guardrail::{require_non_empty, require_organization_id, require_smart_code};
use hera_core::{DynamicFieldInput, GuardrailViolation, OrganizationId};
use hera_rpc_client::entities::{self, EntityQuery, EntityUpsert};
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::auth::{ensure_org_access, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{entity_id, extract_json, extract_query, optional_entity_id, OrgQuery, Validate};
use crate::routes::{observe, require_client};
use crate::state::AppState;

/// Page size used when the caller does not pass `limit`.
const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

/// Entity routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/entities", post(upsert_entity).get(list_entities))
        .route("/entities/:id", get(get_entity).delete(delete_entity))
}

/// Body of `POST /entities`. Presence of `entity_id` makes it an update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EntityUpsertBody {
    /// Owning organization (UUID).
    pub organization_id: Option<String>,
    /// Entity type, e.g. `CUSTOMER`.
    #[serde(default)]
    pub entity_type: String,
    /// Display name.
    #[serde(default)]
    pub entity_name: String,
    /// Entity smart code.
    #[serde(default)]
    pub smart_code: String,
    /// Existing entity to update.
    pub entity_id: Option<String>,
    /// Business code, e.g. a SKU.
    pub entity_code: Option<String>,
    /// Parent in a hierarchy.
    pub parent_entity_id: Option<String>,
    /// Lifecycle status.
    pub status: Option<String>,
    /// Free-form metadata.
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
    /// Dynamic field values.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub dynamic_fields: Vec<DynamicFieldInput>,
}

impl Validate for EntityUpsertBody {
    type Validated = EntityUpsert;

    fn validate(self) -> Result<EntityUpsert, GuardrailViolation> {
        let organization_id = require_organization_id(self.organization_id.as_deref())?;
        require_non_empty("entity_type", &self.entity_type)?;
        require_non_empty("entity_name", &self.entity_name)?;
        let smart_code = require_smart_code("smart_code", &self.smart_code)?;
        let entity_id = optional_entity_id("entity_id", self.entity_id.as_deref())?;
        let parent_entity_id =
            optional_entity_id("parent_entity_id", self.parent_entity_id.as_deref())?;
        validate_fields(&self.dynamic_fields, "dynamic_fields")?;

        Ok(EntityUpsert {
            organization_id,
            entity_type: self.entity_type.trim().to_ascii_uppercase(),
            entity_name: self.entity_name,
            smart_code,
            entity_id,
            entity_code: self.entity_code,
            parent_entity_id,
            status: self.status,
            metadata: self.metadata,
            dynamic_fields: self.dynamic_fields,
        })
    }
}

/// Query of `GET /entities`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListEntitiesQuery {
    /// Organization to list.
    pub organization_id: Option<String>,
    /// Restrict to one entity type.
    pub entity_type: Option<String>,
    /// Page size (default 100, max 1000).
    pub limit: Option<u32>,
    /// Page offset.
    pub offset: Option<u32>,
    /// Include dynamic field values.
    #[serde(default)]
    pub include_dynamic: bool,
}

/// Query of `DELETE /entities/:id`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteEntityQuery {
    /// Owning organization.
    pub organization_id: Option<String>,
    /// Remove the row instead of marking it deleted.
    #[serde(default)]
    pub hard_delete: bool,
}

fn scoped_org(caller: &CallerIdentity, raw: Option<&str>) -> Result<OrganizationId, AppError> {
    let org = require_organization_id(raw)?;
    ensure_org_access(caller, &org)?;
    Ok(org)
}

/// POST /api/universal/entities: create or update an entity.
#[utoipa::path(
    post,
    path = "/api/universal/entities",
    request_body = EntityUpsertBody,
    responses(
        (status = 200, description = "Procedure result"),
        (status = 400, description = "Guardrail failure or procedure rejection", body = crate::error::ErrorBody),
        (status = 403, description = "Organization outside the caller's scope", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "entities"
)]
pub async fn upsert_entity(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<EntityUpsertBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let mut body = extract_json(body)?;

    let preset = state.registry.get(body.entity_type.trim());
    if let Some(preset) = preset {
        preset.complete_inputs(&mut body.dynamic_fields);
    }
    let upsert = body.validate()?;
    if let Some(preset) = preset {
        preset.validate_dynamic_fields(&upsert.dynamic_fields, upsert.entity_id.is_none())?;
    }
    ensure_org_access(&caller, &upsert.organization_id)?;

    let client = require_client(&state)?;
    tracing::debug!(
        organization_id = %upsert.organization_id,
        entity_type = %upsert.entity_type,
        update = upsert.entity_id.is_some(),
        "forwarding entity upsert"
    );
    let result = client.entities().upsert(&upsert).await;
    observe(&state.metrics, entities::UPSERT, result).map(Json)
}

/// GET /api/universal/entities: list entities of an organization.
#[utoipa::path(
    get,
    path = "/api/universal/entities",
    params(ListEntitiesQuery),
    responses(
        (status = 200, description = "Procedure result"),
        (status = 400, description = "Missing or malformed organization_id", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "entities"
)]
pub async fn list_entities(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<ListEntitiesQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let query = extract_query(query)?;
    let org = scoped_org(&caller, query.organization_id.as_deref())?;
    let client = require_client(&state)?;

    let filter = EntityQuery {
        entity_id: None,
        entity_type: query
            .entity_type
            .map(|t| t.trim().to_ascii_uppercase())
            .filter(|t| !t.is_empty()),
        include_dynamic: query.include_dynamic,
        include_relationships: false,
        limit: Some(query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)),
        offset: query.offset,
    };
    let result = client.entities().read(&org, &filter).await;
    observe(&state.metrics, entities::READ, result).map(Json)
}

/// GET /api/universal/entities/{id}: read one entity with its dynamic
/// fields and relationships.
#[utoipa::path(
    get,
    path = "/api/universal/entities/:id",
    params(
        ("id" = String, Path, description = "Entity UUID"),
        ("organization_id" = String, Query, description = "Owning organization"),
    ),
    responses(
        (status = 200, description = "Entity found"),
        (status = 400, description = "Malformed id or organization_id", body = crate::error::ErrorBody),
        (status = 404, description = "Entity not found", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "entities"
)]
pub async fn get_entity(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    query: Result<Query<OrgQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let query = extract_query(query)?;
    let org = scoped_org(&caller, query.organization_id.as_deref())?;
    let id = entity_id("id", &id)?;
    let client = require_client(&state)?;

    let result = client.entities().get(&org, &id).await;
    observe(&state.metrics, entities::READ, result)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("entity {id} not found")))
}

/// DELETE /api/universal/entities/{id}: soft (default) or hard delete.
#[utoipa::path(
    delete,
    path = "/api/universal/entities/:id",
    params(
        ("id" = String, Path, description = "Entity UUID"),
        DeleteEntityQuery,
    ),
    responses(
        (status = 200, description = "Procedure result"),
        (status = 400, description = "Malformed id or organization_id", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "entities"
)]
pub async fn delete_entity(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    query: Result<Query<DeleteEntityQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let query = extract_query(query)?;
    let org = scoped_org(&caller, query.organization_id.as_deref())?;
    let id = entity_id("id", &id)?;
    let client = require_client(&state)?;

    tracing::info!(organization_id = %org, entity_id = %id, hard = query.hard_delete, "deleting entity");
    let result = client.entities().delete(&org, &id, query.hard_delete).await;
    observe(&state.metrics, entities::DELETE, result).map(Json)
}
