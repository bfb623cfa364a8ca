//! Read-only access to the entity preset catalog.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use hera_core::EntityPreset;

use crate::error::AppError;
use crate::state::AppState;

/// Preset routes (v2 only).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/presets", get(list_presets))
        .route("/presets/:entity_type", get(get_preset))
}

/// GET /api/v2/presets: every preset, sorted by entity type.
#[utoipa::path(
    get,
    path = "/api/v2/presets",
    responses((status = 200, description = "Preset catalog")),
    tag = "presets"
)]
pub async fn list_presets(State(state): State<AppState>) -> Json<Vec<EntityPreset>> {
    Json(state.registry.list().into_iter().cloned().collect())
}

/// GET /api/v2/presets/{entity_type}: one preset; the type is case-insensitive.
#[utoipa::path(
    get,
    path = "/api/v2/presets/:entity_type",
    params(("entity_type" = String, Path, description = "Entity type, e.g. CUSTOMER")),
    responses(
        (status = 200, description = "Preset found"),
        (status = 404, description = "No preset for the type", body = crate::error::ErrorBody),
    ),
    tag = "presets"
)]
pub async fn get_preset(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
) -> Result<Json<EntityPreset>, AppError> {
    state
        .registry
        .get(&entity_type)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no preset for entity type {entity_type}")))
}
