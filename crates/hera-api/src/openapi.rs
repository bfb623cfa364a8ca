//! # OpenAPI Document Assembly
//!
//! Collects the utoipa-documented handlers into one OpenAPI document served
//! at `/openapi.json`. Resource routes are documented under
//! `/api/universal`; the same handlers also answer under `/api/v2`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "HERA Universal API",
        version = "0.1.0",
        description = "Guardrail-checked gateway to the HERA entity, relationship, dynamic data and transaction stored procedures.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::entities::upsert_entity,
        crate::routes::entities::list_entities,
        crate::routes::entities::get_entity,
        crate::routes::entities::delete_entity,
        crate::routes::dynamic_data::set_dynamic_data,
        crate::routes::dynamic_data::get_dynamic_data,
        crate::routes::relationships::upsert_relationships,
        crate::routes::transactions::emit_transactions,
        crate::routes::transactions::get_transaction,
        crate::routes::pos::checkout,
        crate::routes::presets::list_presets,
        crate::routes::presets::get_preset,
        crate::routes::navigation::navigation,
        crate::routes::smart_codes::validate_smart_code,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::routes::entities::EntityUpsertBody,
        crate::routes::dynamic_data::DynamicDataBody,
        crate::routes::relationships::RelationshipInput,
        crate::routes::relationships::RelationshipBatchBody,
        crate::routes::transactions::TransactionBatchBody,
        crate::routes::pos::CheckoutResponse,
        crate::routes::smart_codes::SmartCodeRequest,
        crate::routes::smart_codes::SmartCodeVerdict,
    )),
    tags(
        (name = "entities", description = "Entities of any type in the universal schema"),
        (name = "dynamic-data", description = "Typed dynamic field values"),
        (name = "relationships", description = "Typed links between entities"),
        (name = "transactions", description = "Transactions with lines"),
        (name = "pos", description = "Point-of-sale checkout"),
        (name = "presets", description = "Entity preset catalog"),
        (name = "navigation", description = "Role-filtered navigation"),
        (name = "smart-codes", description = "Smart code format checks"),
    )
)]
pub struct ApiDoc;

/// Router serving the OpenAPI document.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
